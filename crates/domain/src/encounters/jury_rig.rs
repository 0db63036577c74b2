//! Jury-rigging a mechanism
//!
//! The procedure walks Observe, Probe and Pattern before a method is chosen
//! and tried. A failed experiment that does not end the session moves to
//! Iterate, and iterating teaches the character one point of difficulty
//! before the next method selection.
//!
//! Failures that are not fumbles draw on a separate complication die. It is
//! independent of the skill check and has to be rolled by the host.

use serde::{Deserialize, Serialize};

use super::{Advance, CheckSpec, EncounterMachine, EncounterState};
use crate::error::DomainError;
use crate::events::ConsequenceEvent;
use crate::ids::EncounterId;
use crate::value_objects::{CheckOutcome, OutcomeTier, DEFAULT_SUCCESS_FACE, MAX_DIFFICULTY_CLASS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JuryRigStep {
    Observe,
    Probe,
    Pattern,
    MethodSelection,
    Experiment,
    Iterate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JuryRigStatus {
    InProgress,
    Bypassed,
    Destroyed,
    MechanismDestroyed,
    PermanentlyLocked,
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JuryRigTerminal {
    Bypassed,
    /// Taken apart on purpose; salvage recovered
    Destroyed,
    /// Wrecked by a fumble
    MechanismDestroyed,
    PermanentlyLocked,
    Abandoned,
}

impl From<JuryRigTerminal> for JuryRigStatus {
    fn from(terminal: JuryRigTerminal) -> Self {
        match terminal {
            JuryRigTerminal::Bypassed => Self::Bypassed,
            JuryRigTerminal::Destroyed => Self::Destroyed,
            JuryRigTerminal::MechanismDestroyed => Self::MechanismDestroyed,
            JuryRigTerminal::PermanentlyLocked => Self::PermanentlyLocked,
            JuryRigTerminal::Abandoned => Self::Abandoned,
        }
    }
}

/// What is being rigged. Decides the components a salvage yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MechanismKind {
    Terminal,
    DoorLock,
    SecurityPanel,
    Elevator,
    PowerJunction,
    VendingMachine,
    Communication,
    ClimateControl,
    /// Jotun-built machinery
    JotunDevice,
    #[default]
    Unknown,
}

impl MechanismKind {
    pub fn salvage(&self) -> &'static [&'static str] {
        match self {
            Self::Terminal => &["circuit-board", "display-unit", "processing-chip"],
            Self::DoorLock => &["lock-mechanism", "servo-motor", "keycard-reader"],
            Self::SecurityPanel => &["sensor-array", "alarm-module", "blighted-power-cell"],
            Self::Elevator => &["control-board", "cable-spool", "safety-relay"],
            Self::PowerJunction => &["capacitor", "transformer-coil", "power-regulator"],
            Self::VendingMachine => &["coin-mechanism", "dispensing-motor", "selection-panel"],
            Self::Communication => &["antenna-array", "signal-processor", "transmitter-module"],
            Self::ClimateControl => &["thermostat", "fan-motor", "filter-housing"],
            Self::JotunDevice => &[
                "jotun-mechanism-fragment",
                "ancient-power-core",
                "rune-circuitry",
            ],
            Self::Unknown => &["unknown-component", "salvaged-part"],
        }
    }

    fn salvage_event(&self) -> ConsequenceEvent {
        ConsequenceEvent::GrantSalvage {
            components: self.salvage().iter().map(|c| c.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BypassMethod {
    PercussiveMaintenance,
    WireManipulation,
    GlitchExploitation,
    MemorizedSequence,
    BruteDisassembly,
    PowerCycling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Complication {
    PermanentLock,
    AlarmTriggered,
    SparksFly,
    Nothing,
    PartialSuccess,
    GlitchInFavor,
}

impl Complication {
    pub fn from_roll(roll: u8) -> Result<Self, DomainError> {
        Ok(match roll {
            1 => Self::PermanentLock,
            2 | 3 => Self::AlarmTriggered,
            4 | 5 => Self::SparksFly,
            6 | 7 => Self::Nothing,
            8 | 9 => Self::PartialSuccess,
            10 => Self::GlitchInFavor,
            other => {
                return Err(DomainError::validation(format!(
                    "complication roll {other} is off the d10 table"
                )))
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum JuryRigAction {
    Observe {
        outcome: CheckOutcome,
    },
    Probe,
    RecognizePattern {
        outcome: CheckOutcome,
    },
    /// Skip Observe or Pattern
    Skip,
    SelectMethod {
        method: BypassMethod,
    },
    Experiment {
        outcome: CheckOutcome,
        /// Required whenever the experiment fails without a fumble
        complication_roll: Option<u8>,
    },
    Iterate,
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentRecord {
    pub method: BypassMethod,
    pub difficulty_class: i32,
    pub tier: OutcomeTier,
    pub complication: Option<Complication>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "JuryRigStateRecord")]
pub struct JuryRigState {
    pub id: EncounterId,
    pub mechanism: MechanismKind,
    pub step: JuryRigStep,
    pub round: u32,
    pub base_dc: i32,
    pub dc_reduction: i32,
    /// Whether the mechanism is glitched, known only after probing
    pub glitched: bool,
    pub glitch_revealed: bool,
    pub hints: Vec<String>,
    pub hints_revealed: bool,
    pub familiar: bool,
    /// Bonus dice waiting for the next experiment
    pub familiarity_bonus_pending: bool,
    pub selected_method: Option<BypassMethod>,
    pub alarm_triggered: bool,
    pub attempts: Vec<ExperimentRecord>,
    pub terminal: Option<JuryRigTerminal>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JuryRigStateRecord {
    id: EncounterId,
    #[serde(default)]
    mechanism: MechanismKind,
    step: JuryRigStep,
    round: u32,
    base_dc: i32,
    dc_reduction: i32,
    glitched: bool,
    glitch_revealed: bool,
    hints: Vec<String>,
    hints_revealed: bool,
    familiar: bool,
    familiarity_bonus_pending: bool,
    selected_method: Option<BypassMethod>,
    alarm_triggered: bool,
    attempts: Vec<ExperimentRecord>,
    terminal: Option<JuryRigTerminal>,
}

impl TryFrom<JuryRigStateRecord> for JuryRigState {
    type Error = DomainError;

    fn try_from(record: JuryRigStateRecord) -> Result<Self, Self::Error> {
        if !(0..=MAX_DIFFICULTY_CLASS).contains(&record.base_dc) || record.dc_reduction < 0 {
            return Err(DomainError::validation(format!(
                "mechanism DC {} with reduction {} is out of range",
                record.base_dc, record.dc_reduction
            )));
        }
        if record.step == JuryRigStep::Experiment && record.selected_method.is_none() {
            return Err(DomainError::validation("experiment step without a chosen method"));
        }
        if record.familiarity_bonus_pending && !record.familiar {
            return Err(DomainError::validation(
                "familiarity bonus pending on an unfamiliar mechanism",
            ));
        }
        Ok(Self {
            id: record.id,
            mechanism: record.mechanism,
            step: record.step,
            round: record.round,
            base_dc: record.base_dc,
            dc_reduction: record.dc_reduction,
            glitched: record.glitched,
            glitch_revealed: record.glitch_revealed,
            hints: record.hints,
            hints_revealed: record.hints_revealed,
            familiar: record.familiar,
            familiarity_bonus_pending: record.familiarity_bonus_pending,
            selected_method: record.selected_method,
            alarm_triggered: record.alarm_triggered,
            attempts: record.attempts,
            terminal: record.terminal,
        })
    }
}

impl JuryRigState {
    pub fn status(&self) -> JuryRigStatus {
        self.terminal
            .map_or(JuryRigStatus::InProgress, JuryRigStatus::from)
    }

    pub fn known_glitched(&self) -> bool {
        self.glitch_revealed && self.glitched
    }
}

impl EncounterState for JuryRigState {
    type Terminal = JuryRigTerminal;

    fn terminal(&self) -> Option<JuryRigTerminal> {
        self.terminal
    }

    fn round(&self) -> u32 {
        self.round
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JuryRigConfig {
    pub observe_dc: i32,
    pub pattern_dc: i32,
    pub familiarity_bonus_dice: u32,
    pub min_dc: i32,
    pub max_dc_reduction: i32,
    pub success_face: u8,
    /// Damage of the SparksFly complication
    pub sparks_dice: u32,
    pub sparks_faces: u8,
}

impl Default for JuryRigConfig {
    fn default() -> Self {
        Self {
            observe_dc: 1,
            pattern_dc: 2,
            familiarity_bonus_dice: 2,
            min_dc: 1,
            max_dc_reduction: 3,
            success_face: DEFAULT_SUCCESS_FACE,
            sparks_dice: 1,
            sparks_faces: 6,
        }
    }
}

impl JuryRigConfig {
    pub fn method_modifier(&self, method: BypassMethod) -> i32 {
        match method {
            BypassMethod::PercussiveMaintenance | BypassMethod::PowerCycling => 0,
            BypassMethod::WireManipulation | BypassMethod::MemorizedSequence => -1,
            BypassMethod::GlitchExploitation => -2,
            BypassMethod::BruteDisassembly => 1,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.min_dc < 0 || self.min_dc > MAX_DIFFICULTY_CLASS {
            return Err(DomainError::validation("jury-rig minimum DC out of range"));
        }
        if self.max_dc_reduction < 0 {
            return Err(DomainError::validation(
                "jury-rig DC reduction cap cannot be negative",
            ));
        }
        if self.sparks_faces < 2 {
            return Err(DomainError::validation("sparks damage needs at least a d2"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct JuryRigRules {
    config: JuryRigConfig,
}

impl JuryRigRules {
    pub fn new(config: JuryRigConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JuryRigConfig {
        &self.config
    }

    /// Start on a mechanism. `hints` are revealed by a good observation and
    /// `glitched` by probing.
    pub fn open(
        &self,
        id: EncounterId,
        mechanism: MechanismKind,
        base_dc: i32,
        glitched: bool,
        hints: Vec<String>,
    ) -> Result<JuryRigState, DomainError> {
        if base_dc < self.config.min_dc || base_dc > MAX_DIFFICULTY_CLASS {
            return Err(DomainError::validation(format!(
                "mechanism DC {base_dc} must be within {}..={MAX_DIFFICULTY_CLASS}",
                self.config.min_dc
            )));
        }
        Ok(JuryRigState {
            id,
            mechanism,
            step: JuryRigStep::Observe,
            round: 0,
            base_dc,
            dc_reduction: 0,
            glitched,
            glitch_revealed: false,
            hints,
            hints_revealed: false,
            familiar: false,
            familiarity_bonus_pending: false,
            selected_method: None,
            alarm_triggered: false,
            attempts: Vec::new(),
            terminal: None,
        })
    }

    pub fn effective_dc(&self, state: &JuryRigState, method: BypassMethod) -> i32 {
        (state.base_dc - state.dc_reduction + self.config.method_modifier(method))
            .max(self.config.min_dc)
            .min(MAX_DIFFICULTY_CLASS)
    }

    /// What to roll at the current step, if anything.
    pub fn check_for(
        &self,
        state: &JuryRigState,
        base_pool: u32,
    ) -> Result<Option<CheckSpec>, DomainError> {
        if state.is_terminal() {
            return Err(DomainError::invalid_state_transition(
                "jury-rig session already ended",
            ));
        }
        let spec = |pool, difficulty_class| CheckSpec {
            pool,
            difficulty_class,
            success_face: self.config.success_face,
        };
        Ok(match state.step {
            JuryRigStep::Observe => Some(spec(base_pool, self.config.observe_dc)),
            JuryRigStep::Pattern => Some(spec(base_pool, self.config.pattern_dc)),
            JuryRigStep::Experiment => {
                let method = Self::selected(state)?;
                let bonus = if state.familiarity_bonus_pending {
                    self.config.familiarity_bonus_dice
                } else {
                    0
                };
                Some(spec(
                    base_pool.saturating_add(bonus),
                    self.effective_dc(state, method),
                ))
            }
            JuryRigStep::Probe | JuryRigStep::MethodSelection | JuryRigStep::Iterate => None,
        })
    }

    fn selected(state: &JuryRigState) -> Result<BypassMethod, DomainError> {
        state.selected_method.ok_or_else(|| {
            DomainError::invalid_state_transition("experiment without a selected method")
        })
    }

    /// Reject outcomes rolled against some other difficulty.
    fn expect_dc(outcome: &CheckOutcome, expected: i32) -> Result<(), DomainError> {
        if outcome.difficulty_class != expected {
            return Err(DomainError::validation(format!(
                "check was rolled against DC {}, this step needs DC {expected}",
                outcome.difficulty_class
            )));
        }
        Ok(())
    }

    fn expect_step(state: &JuryRigState, expected: &[JuryRigStep]) -> Result<(), DomainError> {
        if expected.contains(&state.step) {
            Ok(())
        } else {
            Err(DomainError::invalid_state_transition(format!(
                "action not allowed at the {:?} step",
                state.step
            )))
        }
    }

    fn select(
        &self,
        state: &JuryRigState,
        method: BypassMethod,
    ) -> Result<JuryRigState, DomainError> {
        Self::expect_step(state, &[JuryRigStep::MethodSelection])?;
        match method {
            BypassMethod::GlitchExploitation if !state.known_glitched() => {
                return Err(DomainError::constraint(
                    "glitch exploitation needs a mechanism known to be glitched",
                ))
            }
            BypassMethod::MemorizedSequence if !state.familiar => {
                return Err(DomainError::constraint(
                    "memorized sequence needs familiarity with the mechanism",
                ))
            }
            _ => {}
        }
        let mut next = state.clone();
        next.selected_method = Some(method);
        next.step = JuryRigStep::Experiment;
        Ok(next)
    }

    fn experiment(
        &self,
        state: &JuryRigState,
        outcome: &CheckOutcome,
        complication_roll: Option<u8>,
    ) -> Result<Advance<JuryRigState>, DomainError> {
        Self::expect_step(state, &[JuryRigStep::Experiment])?;
        let method = Self::selected(state)?;
        Self::expect_dc(outcome, self.effective_dc(state, method))?;

        let complication = if !outcome.is_fumble && !outcome.is_success() {
            let roll = complication_roll.ok_or_else(|| {
                DomainError::validation("a failed experiment needs a complication roll")
            })?;
            Some(Complication::from_roll(roll)?)
        } else {
            None
        };

        let mut next = state.clone();
        let mut events = Vec::new();
        next.familiarity_bonus_pending = false;
        next.attempts.push(ExperimentRecord {
            method,
            difficulty_class: outcome.difficulty_class,
            tier: outcome.tier,
            complication,
        });

        if outcome.is_fumble {
            next.terminal = Some(JuryRigTerminal::MechanismDestroyed);
        } else if outcome.is_success() {
            if method == BypassMethod::BruteDisassembly {
                next.terminal = Some(JuryRigTerminal::Destroyed);
                events.push(state.mechanism.salvage_event());
            } else {
                next.terminal = Some(JuryRigTerminal::Bypassed);
                if outcome.tier == OutcomeTier::CriticalSuccess {
                    events.push(state.mechanism.salvage_event());
                }
            }
        } else {
            match complication {
                Some(Complication::PermanentLock) => {
                    next.terminal = Some(JuryRigTerminal::PermanentlyLocked);
                }
                Some(Complication::AlarmTriggered) => {
                    next.alarm_triggered = true;
                    events.push(ConsequenceEvent::AlarmTriggered);
                }
                Some(Complication::SparksFly) => events.push(ConsequenceEvent::Damage {
                    dice: self.config.sparks_dice,
                    faces: self.config.sparks_faces,
                }),
                Some(Complication::GlitchInFavor) => {
                    next.terminal = Some(JuryRigTerminal::Bypassed);
                }
                Some(Complication::Nothing | Complication::PartialSuccess) | None => {}
            }
        }

        if next.terminal.is_none() {
            next.step = JuryRigStep::Iterate;
        }
        Ok(Advance::new(next, events))
    }
}

impl EncounterMachine for JuryRigRules {
    type State = JuryRigState;
    type Action = JuryRigAction;

    fn step(
        &self,
        state: &JuryRigState,
        action: &JuryRigAction,
    ) -> Result<Advance<JuryRigState>, DomainError> {
        let mut events = Vec::new();
        let mut next = match action {
            JuryRigAction::Observe { outcome } => {
                Self::expect_step(state, &[JuryRigStep::Observe])?;
                Self::expect_dc(outcome, self.config.observe_dc)?;
                let mut next = state.clone();
                if outcome.is_success() {
                    next.hints_revealed = true;
                    events.push(ConsequenceEvent::RevealHints {
                        hints: next.hints.clone(),
                    });
                }
                next.step = JuryRigStep::Probe;
                next
            }
            JuryRigAction::Probe => {
                Self::expect_step(state, &[JuryRigStep::Probe])?;
                let mut next = state.clone();
                next.glitch_revealed = true;
                events.push(ConsequenceEvent::RevealGlitch {
                    glitched: next.glitched,
                });
                next.step = JuryRigStep::Pattern;
                next
            }
            JuryRigAction::RecognizePattern { outcome } => {
                Self::expect_step(state, &[JuryRigStep::Pattern])?;
                Self::expect_dc(outcome, self.config.pattern_dc)?;
                let mut next = state.clone();
                if outcome.is_success() {
                    next.familiar = true;
                    next.familiarity_bonus_pending = true;
                }
                next.step = JuryRigStep::MethodSelection;
                next
            }
            JuryRigAction::Skip => {
                Self::expect_step(state, &[JuryRigStep::Observe, JuryRigStep::Pattern])?;
                let mut next = state.clone();
                next.step = match state.step {
                    JuryRigStep::Observe => JuryRigStep::Probe,
                    _ => JuryRigStep::MethodSelection,
                };
                next
            }
            JuryRigAction::SelectMethod { method } => self.select(state, *method)?,
            JuryRigAction::Experiment {
                outcome,
                complication_roll,
            } => {
                let advanced = self.experiment(state, outcome, *complication_roll)?;
                events = advanced.events;
                advanced.state
            }
            JuryRigAction::Iterate => {
                Self::expect_step(state, &[JuryRigStep::Iterate])?;
                let mut next = state.clone();
                next.dc_reduction = (next.dc_reduction + 1).min(self.config.max_dc_reduction);
                next.selected_method = None;
                next.step = JuryRigStep::MethodSelection;
                next
            }
            JuryRigAction::Abandon => {
                let mut next = state.clone();
                next.terminal = Some(JuryRigTerminal::Abandoned);
                next
            }
        };
        next.round += 1;
        Ok(Advance::new(next, events))
    }
}
