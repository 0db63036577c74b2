//! Interrogation encounter
//!
//! A subject's resistance counts down by one for every successful round and
//! never climbs back while the session runs. Zero breaks the subject on that
//! exact round. Running out of rounds first leaves the subject resisting.
//!
//! Torture taints everything: once it has been used, whatever information
//! comes out is capped in reliability for the rest of the session.

use serde::{Deserialize, Serialize};

use super::{Advance, CheckSpec, EncounterMachine, EncounterState};
use crate::error::DomainError;
use crate::events::ConsequenceEvent;
use crate::ids::EncounterId;
use crate::value_objects::{CheckOutcome, MAX_DIFFICULTY_CLASS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResistanceLevel {
    Minimal,
    Low,
    Moderate,
    High,
    Extreme,
}

impl ResistanceLevel {
    fn index(self) -> usize {
        match self {
            Self::Minimal => 0,
            Self::Low => 1,
            Self::Moderate => 2,
            Self::High => 3,
            Self::Extreme => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterrogationMethod {
    GoodCop,
    BadCop,
    Deception,
    Bribery,
    /// The extreme method; taints the session
    Torture,
}

impl InterrogationMethod {
    fn index(self) -> usize {
        match self {
            Self::GoodCop => 0,
            Self::BadCop => 1,
            Self::Deception => 2,
            Self::Bribery => 3,
            Self::Torture => 4,
        }
    }

    pub fn fumble(&self) -> InterrogationFumble {
        match self {
            Self::GoodCop | Self::Bribery => InterrogationFumble::TrustShattered,
            Self::BadCop => InterrogationFumble::ChallengeAccepted,
            Self::Deception => InterrogationFumble::LieExposed,
            Self::Torture => InterrogationFumble::SubjectBroken,
        }
    }

    pub fn is_extreme(&self) -> bool {
        matches!(self, Self::Torture)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterrogationFumble {
    /// The method stops working on this subject
    TrustShattered,
    /// The subject lashes out
    ChallengeAccepted,
    /// The ruse is seen through
    LieExposed,
    /// The subject is ruined and can tell nothing more
    SubjectBroken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterrogationPhase {
    NotStarted,
    InProgress,
    SubjectBroken,
    Abandoned,
    SubjectResisting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbandonReason {
    /// The interrogator walked away
    Voluntary,
    /// A torture fumble left nothing to question
    SubjectRuined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "outcome", content = "reason")]
pub enum InterrogationTerminal {
    SubjectBroken,
    Abandoned(AbandonReason),
    SubjectResisting,
}

impl InterrogationTerminal {
    pub fn phase(&self) -> InterrogationPhase {
        match self {
            Self::SubjectBroken => InterrogationPhase::SubjectBroken,
            Self::Abandoned(_) => InterrogationPhase::Abandoned,
            Self::SubjectResisting => InterrogationPhase::SubjectResisting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "action")]
pub enum InterrogationAction {
    Question {
        method: InterrogationMethod,
        outcome: CheckOutcome,
    },
    Abandon,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterrogationRound {
    pub round: u32,
    pub method: InterrogationMethod,
    pub success: bool,
    pub fumble: bool,
    pub resistance_after: u32,
}

/// Persisted interrogation session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "InterrogationStateRecord")]
pub struct InterrogationState {
    pub id: EncounterId,
    pub subject_will: u32,
    pub resistance_level: ResistanceLevel,
    pub phase: InterrogationPhase,
    pub initial_resistance: u32,
    pub resistance: u32,
    pub round: u32,
    pub max_rounds: u32,
    /// Method of every questioning round, in order
    pub methods_used: Vec<InterrogationMethod>,
    /// Sticky once torture has been used
    pub used_extreme_method: bool,
    /// Only ever lowered
    pub reliability_cap: Option<u8>,
    pub barred_methods: Vec<InterrogationMethod>,
    pub minutes_elapsed: u32,
    pub bribes_paid: u32,
    pub terminal: Option<InterrogationTerminal>,
    pub history: Vec<InterrogationRound>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterrogationStateRecord {
    id: EncounterId,
    subject_will: u32,
    resistance_level: ResistanceLevel,
    phase: InterrogationPhase,
    initial_resistance: u32,
    resistance: u32,
    round: u32,
    max_rounds: u32,
    methods_used: Vec<InterrogationMethod>,
    used_extreme_method: bool,
    reliability_cap: Option<u8>,
    barred_methods: Vec<InterrogationMethod>,
    minutes_elapsed: u32,
    bribes_paid: u32,
    terminal: Option<InterrogationTerminal>,
    history: Vec<InterrogationRound>,
}

impl TryFrom<InterrogationStateRecord> for InterrogationState {
    type Error = DomainError;

    fn try_from(record: InterrogationStateRecord) -> Result<Self, Self::Error> {
        if record.resistance > record.initial_resistance {
            return Err(DomainError::validation(format!(
                "resistance {} above its starting {}",
                record.resistance, record.initial_resistance
            )));
        }
        if let Some(cap) = record.reliability_cap.filter(|cap| *cap > 100) {
            return Err(DomainError::validation(format!("reliability cap {cap} above 100")));
        }
        let phase_fits = match record.terminal {
            Some(terminal) => terminal.phase() == record.phase,
            None => matches!(
                record.phase,
                InterrogationPhase::NotStarted | InterrogationPhase::InProgress
            ),
        };
        if !phase_fits {
            return Err(DomainError::validation(format!(
                "phase {:?} does not match terminal {:?}",
                record.phase, record.terminal
            )));
        }
        Ok(Self {
            id: record.id,
            subject_will: record.subject_will,
            resistance_level: record.resistance_level,
            phase: record.phase,
            initial_resistance: record.initial_resistance,
            resistance: record.resistance,
            round: record.round,
            max_rounds: record.max_rounds,
            methods_used: record.methods_used,
            used_extreme_method: record.used_extreme_method,
            reliability_cap: record.reliability_cap,
            barred_methods: record.barred_methods,
            minutes_elapsed: record.minutes_elapsed,
            bribes_paid: record.bribes_paid,
            terminal: record.terminal,
            history: record.history,
        })
    }
}

impl InterrogationState {
    /// Most-used method; ties go to whichever was used first.
    pub fn primary_method(&self) -> Option<InterrogationMethod> {
        let mut best: Option<(InterrogationMethod, usize)> = None;
        for method in &self.methods_used {
            if best.is_some_and(|(m, _)| m == *method) {
                continue;
            }
            let count = self.methods_used.iter().filter(|m| *m == method).count();
            match best {
                Some((_, top)) if top >= count => {}
                _ => best = Some((*method, count)),
            }
        }
        best.map(|(method, _)| method)
    }

    pub fn is_barred(&self, method: InterrogationMethod) -> bool {
        self.barred_methods.contains(&method)
    }
}

impl EncounterState for InterrogationState {
    type Terminal = InterrogationTerminal;

    fn terminal(&self) -> Option<InterrogationTerminal> {
        self.terminal
    }

    fn round(&self) -> u32 {
        self.round
    }
}

/// Per-level resistance numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResistanceProfile {
    /// WILL at or below which a subject falls in this level
    pub max_will: u32,
    pub min_checks: u32,
    pub max_checks: u32,
    pub max_rounds: u32,
    pub will_bonus: i32,
    pub bribe_cost: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodProfile {
    /// Ignored for torture, which scales with the subject's WILL
    pub dc: i32,
    pub reliability: u8,
    pub disposition: i32,
    pub minutes: u32,
}

/// Interrogation tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterrogationConfig {
    /// Minimal through Extreme
    pub levels: [ResistanceProfile; 5],
    /// GoodCop, BadCop, Deception, Bribery, Torture
    pub methods: [MethodProfile; 5],
    pub success_face: u8,
    pub torture_reputation: i32,
    pub torture_fumble_reputation: i32,
    pub torture_reliability_cap: u8,
}

impl Default for InterrogationConfig {
    fn default() -> Self {
        let level = |max_will, min_checks, max_checks, max_rounds, will_bonus, bribe_cost| {
            ResistanceProfile {
                max_will,
                min_checks,
                max_checks,
                max_rounds,
                will_bonus,
                bribe_cost,
            }
        };
        let method = |dc, reliability, disposition, minutes| MethodProfile {
            dc,
            reliability,
            disposition,
            minutes,
        };
        Self {
            levels: [
                level(2, 1, 1, 3, -1, 15),
                level(4, 2, 3, 6, 0, 35),
                level(6, 4, 5, 10, 1, 75),
                level(8, 6, 8, 15, 2, 150),
                level(u32::MAX, 10, 15, 20, 4, 350),
            ],
            methods: [
                method(2, 95, 0, 30),
                method(2, 80, -5, 15),
                method(3, 70, -2, 20),
                method(1, 90, 0, 10),
                method(0, 50, -20, 60),
            ],
            success_face: 8,
            torture_reputation: -30,
            torture_fumble_reputation: -20,
            torture_reliability_cap: 60,
        }
    }
}

impl InterrogationConfig {
    pub fn level_for_will(&self, will: u32) -> ResistanceLevel {
        const ORDER: [ResistanceLevel; 5] = [
            ResistanceLevel::Minimal,
            ResistanceLevel::Low,
            ResistanceLevel::Moderate,
            ResistanceLevel::High,
            ResistanceLevel::Extreme,
        ];
        ORDER
            .into_iter()
            .find(|level| will <= self.levels[level.index()].max_will)
            .unwrap_or(ResistanceLevel::Extreme)
    }

    pub fn level(&self, level: ResistanceLevel) -> ResistanceProfile {
        self.levels[level.index()]
    }

    pub fn method(&self, method: InterrogationMethod) -> MethodProfile {
        self.methods[method.index()]
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self
            .levels
            .iter()
            .any(|l| l.min_checks == 0 || l.min_checks > l.max_checks || l.max_rounds == 0)
        {
            return Err(DomainError::validation(
                "resistance levels need 1 <= min checks <= max checks and a round cap",
            ));
        }
        if self.torture_reliability_cap > 100 || self.methods.iter().any(|m| m.reliability > 100) {
            return Err(DomainError::validation("reliability is a percentage"));
        }
        Ok(())
    }
}

/// Interrogation transition rules.
#[derive(Debug, Clone, Default)]
pub struct InterrogationRules {
    config: InterrogationConfig,
}

impl InterrogationRules {
    pub fn new(config: InterrogationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterrogationConfig {
        &self.config
    }

    /// Prepare a session against a subject. `modifiers` shift the starting
    /// resistance before it is clamped into the level's range.
    pub fn open(&self, id: EncounterId, subject_will: u32, modifiers: i32) -> InterrogationState {
        let level = self.config.level_for_will(subject_will);
        let profile = self.config.level(level);
        let raw = i64::from(subject_will) + i64::from(profile.will_bonus) + i64::from(modifiers);
        let resistance = raw.clamp(i64::from(profile.min_checks), i64::from(profile.max_checks));
        let resistance = u32::try_from(resistance).unwrap_or(profile.min_checks);

        InterrogationState {
            id,
            subject_will,
            resistance_level: level,
            phase: InterrogationPhase::NotStarted,
            initial_resistance: resistance,
            resistance,
            round: 0,
            max_rounds: profile.max_rounds,
            methods_used: Vec::new(),
            used_extreme_method: false,
            reliability_cap: None,
            barred_methods: Vec::new(),
            minutes_elapsed: 0,
            bribes_paid: 0,
            terminal: None,
            history: Vec::new(),
        }
    }

    /// Difficulty for questioning with `method`. Torture scales with WILL
    /// up to the classifier's ceiling.
    pub fn method_dc(&self, state: &InterrogationState, method: InterrogationMethod) -> i32 {
        match method {
            InterrogationMethod::Torture => {
                i32::try_from(state.subject_will.div_ceil(2).max(1))
                    .unwrap_or(i32::MAX)
                    .min(MAX_DIFFICULTY_CLASS)
            }
            _ => self.config.method(method).dc,
        }
    }

    pub fn check_for(
        &self,
        state: &InterrogationState,
        method: InterrogationMethod,
        base_pool: u32,
    ) -> Result<CheckSpec, DomainError> {
        if state.is_terminal() {
            return Err(DomainError::invalid_state_transition(
                "interrogation already ended",
            ));
        }
        Self::ensure_allowed(state, method)?;
        Ok(CheckSpec {
            pool: base_pool,
            difficulty_class: self.method_dc(state, method),
            success_face: self.config.success_face,
        })
    }

    /// Reliability of whatever the session extracts.
    pub fn information_reliability(&self, state: &InterrogationState) -> Option<u8> {
        let primary = state.primary_method()?;
        let base = self.config.method(primary).reliability;
        Some(match state.reliability_cap {
            Some(cap) => base.min(cap),
            None => base,
        })
    }

    fn ensure_allowed(
        state: &InterrogationState,
        method: InterrogationMethod,
    ) -> Result<(), DomainError> {
        if state.is_barred(method) {
            return Err(DomainError::constraint(format!(
                "{method:?} no longer works on this subject"
            )));
        }
        Ok(())
    }

    fn question(
        &self,
        state: &InterrogationState,
        method: InterrogationMethod,
        outcome: &CheckOutcome,
    ) -> Result<Advance<InterrogationState>, DomainError> {
        Self::ensure_allowed(state, method)?;

        let profile = self.config.method(method);
        let mut next = state.clone();
        let mut events = Vec::new();

        next.phase = InterrogationPhase::InProgress;
        next.round += 1;
        next.methods_used.push(method);
        next.minutes_elapsed = next.minutes_elapsed.saturating_add(profile.minutes);
        events.push(ConsequenceEvent::TimeSpent {
            minutes: profile.minutes,
        });
        if profile.disposition != 0 {
            events.push(ConsequenceEvent::DispositionChange {
                amount: profile.disposition,
            });
        }

        match method {
            InterrogationMethod::Bribery => {
                let amount = self.config.level(state.resistance_level).bribe_cost;
                next.bribes_paid = next.bribes_paid.saturating_add(amount);
                events.push(ConsequenceEvent::BribePaid { amount });
            }
            InterrogationMethod::Torture => {
                next.used_extreme_method = true;
                let cap = self.config.torture_reliability_cap;
                next.reliability_cap = Some(next.reliability_cap.map_or(cap, |c| c.min(cap)));
                events.push(ConsequenceEvent::ReputationChange {
                    amount: self.config.torture_reputation,
                });
            }
            _ => {}
        }

        if outcome.is_fumble {
            match method.fumble() {
                InterrogationFumble::SubjectBroken => {
                    next.terminal = Some(InterrogationTerminal::Abandoned(
                        AbandonReason::SubjectRuined,
                    ));
                    events.push(ConsequenceEvent::ReputationChange {
                        amount: self.config.torture_fumble_reputation,
                    });
                }
                InterrogationFumble::ChallengeAccepted => {
                    events.push(ConsequenceEvent::HostileChallenge);
                }
                InterrogationFumble::TrustShattered | InterrogationFumble::LieExposed => {
                    if !next.barred_methods.contains(&method) {
                        next.barred_methods.push(method);
                    }
                }
            }
        } else if outcome.is_success() {
            next.resistance = next.resistance.saturating_sub(1);
        }

        if next.terminal.is_none() {
            if next.resistance == 0 {
                next.terminal = Some(InterrogationTerminal::SubjectBroken);
            } else if next.round >= next.max_rounds {
                next.terminal = Some(InterrogationTerminal::SubjectResisting);
            }
        }

        next.phase = next
            .terminal
            .map_or(InterrogationPhase::InProgress, |terminal| terminal.phase());

        if next.phase == InterrogationPhase::SubjectBroken {
            if let Some(reliability) = self.information_reliability(&next) {
                events.push(ConsequenceEvent::InformationExtracted { reliability });
            }
        }

        next.history.push(InterrogationRound {
            round: next.round,
            method,
            success: outcome.is_success(),
            fumble: outcome.is_fumble,
            resistance_after: next.resistance,
        });

        Ok(Advance::new(next, events))
    }
}

impl EncounterMachine for InterrogationRules {
    type State = InterrogationState;
    type Action = InterrogationAction;

    fn step(
        &self,
        state: &InterrogationState,
        action: &InterrogationAction,
    ) -> Result<Advance<InterrogationState>, DomainError> {
        match action {
            InterrogationAction::Question { method, outcome } => {
                self.question(state, *method, outcome)
            }
            InterrogationAction::Abandon => {
                let mut next = state.clone();
                next.phase = InterrogationPhase::Abandoned;
                next.terminal = Some(InterrogationTerminal::Abandoned(AbandonReason::Voluntary));
                Ok(Advance::new(next, Vec::new()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encounters::advance;

    fn rules() -> InterrogationRules {
        InterrogationRules::default()
    }

    fn success() -> CheckOutcome {
        CheckOutcome::from_counts(3, 0, 2).unwrap()
    }

    fn failure() -> CheckOutcome {
        CheckOutcome::from_counts(1, 0, 2).unwrap()
    }

    fn fumble() -> CheckOutcome {
        CheckOutcome::from_counts(0, 2, 2).unwrap()
    }

    fn ask(method: InterrogationMethod, outcome: CheckOutcome) -> InterrogationAction {
        InterrogationAction::Question { method, outcome }
    }

    #[test]
    fn test_level_from_will() {
        let config = InterrogationConfig::default();
        assert_eq!(config.level_for_will(1), ResistanceLevel::Minimal);
        assert_eq!(config.level_for_will(4), ResistanceLevel::Low);
        assert_eq!(config.level_for_will(5), ResistanceLevel::Moderate);
        assert_eq!(config.level_for_will(8), ResistanceLevel::High);
        assert_eq!(config.level_for_will(9), ResistanceLevel::Extreme);
    }

    #[test]
    fn test_initial_resistance_clamped_to_level() {
        let rules = rules();
        assert_eq!(rules.open(EncounterId::new(), 1, 0).resistance, 1);
        assert_eq!(rules.open(EncounterId::new(), 3, 0).resistance, 3);
        assert_eq!(rules.open(EncounterId::new(), 3, 5).resistance, 3);
        assert_eq!(rules.open(EncounterId::new(), 7, 0).resistance, 8);
        assert_eq!(rules.open(EncounterId::new(), 12, 0).resistance, 15);
        assert_eq!(rules.open(EncounterId::new(), 9, -5).resistance, 10);
    }

    #[test]
    fn test_breaks_exactly_on_third_success() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 3, 0);
        assert_eq!(state.resistance, 3);
        assert_eq!(state.phase, InterrogationPhase::NotStarted);

        let one = advance(&rules, &state, &ask(InterrogationMethod::GoodCop, success())).unwrap();
        assert_eq!(one.state.phase, InterrogationPhase::InProgress);
        assert_eq!(one.state.resistance, 2);

        let two =
            advance(&rules, &one.state, &ask(InterrogationMethod::GoodCop, success())).unwrap();
        assert!(two.terminal().is_none());

        let three =
            advance(&rules, &two.state, &ask(InterrogationMethod::GoodCop, success())).unwrap();
        assert_eq!(three.state.round, 3);
        assert_eq!(three.terminal(), Some(InterrogationTerminal::SubjectBroken));
        assert!(three
            .events
            .contains(&ConsequenceEvent::InformationExtracted { reliability: 95 }));

        let again = ask(InterrogationMethod::GoodCop, success());
        assert!(advance(&rules, &three.state, &again).is_err());
    }

    #[test]
    fn test_resistance_never_increases() {
        let rules = rules();
        let mut state = rules.open(EncounterId::new(), 6, 0);
        let script = [success(), failure(), fumble(), success(), failure()];
        let methods = [
            InterrogationMethod::BadCop,
            InterrogationMethod::BadCop,
            InterrogationMethod::BadCop,
            InterrogationMethod::Deception,
            InterrogationMethod::Bribery,
        ];
        for (outcome, method) in script.into_iter().zip(methods) {
            let before = state.resistance;
            state = advance(&rules, &state, &ask(method, outcome)).unwrap().state;
            assert!(state.resistance <= before);
        }
    }

    #[test]
    fn test_round_cap_leaves_subject_resisting() {
        let rules = rules();
        let mut state = rules.open(EncounterId::new(), 2, 0);
        for _ in 0..3 {
            state = advance(&rules, &state, &ask(InterrogationMethod::Bribery, failure()))
                .unwrap()
                .state;
        }
        assert_eq!(state.terminal, Some(InterrogationTerminal::SubjectResisting));
        assert_eq!(state.phase, InterrogationPhase::SubjectResisting);
        assert_eq!(state.bribes_paid, 45);
    }

    #[test]
    fn test_large_configured_costs_saturate() {
        let mut config = InterrogationConfig::default();
        config.levels[0].bribe_cost = u32::MAX;
        config.methods[3].minutes = u32::MAX;
        let rules = InterrogationRules::new(config);
        let mut state = rules.open(EncounterId::new(), 2, 0);
        for _ in 0..2 {
            state = advance(&rules, &state, &ask(InterrogationMethod::Bribery, failure()))
                .unwrap()
                .state;
        }
        assert_eq!(state.minutes_elapsed, u32::MAX);
        assert_eq!(state.bribes_paid, u32::MAX);
    }

    #[test]
    fn test_abandon_any_time() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 5, 0);
        let done = advance(&rules, &state, &InterrogationAction::Abandon).unwrap();
        assert_eq!(
            done.terminal(),
            Some(InterrogationTerminal::Abandoned(AbandonReason::Voluntary))
        );
        assert_eq!(done.state.phase, InterrogationPhase::Abandoned);
    }

    #[test]
    fn test_torture_caps_reliability_for_good() {
        let rules = rules();
        let mut state = rules.open(EncounterId::new(), 9, 0);
        state = advance(&rules, &state, &ask(InterrogationMethod::Torture, success()))
            .unwrap()
            .state;
        assert!(state.used_extreme_method);
        assert_eq!(state.reliability_cap, Some(60));

        for _ in 0..3 {
            state = advance(&rules, &state, &ask(InterrogationMethod::GoodCop, success()))
                .unwrap()
                .state;
        }
        assert_eq!(state.primary_method(), Some(InterrogationMethod::GoodCop));
        assert!(state.used_extreme_method);
        assert_eq!(rules.information_reliability(&state), Some(60));
    }

    #[test]
    fn test_torture_costs_reputation_and_fumble_ruins_subject() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 6, 0);
        let result = advance(&rules, &state, &ask(InterrogationMethod::Torture, fumble())).unwrap();
        assert!(result
            .events
            .contains(&ConsequenceEvent::ReputationChange { amount: -30 }));
        assert!(result
            .events
            .contains(&ConsequenceEvent::ReputationChange { amount: -20 }));
        assert_eq!(
            result.terminal(),
            Some(InterrogationTerminal::Abandoned(AbandonReason::SubjectRuined))
        );
    }

    #[test]
    fn test_fumbles_bar_methods() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 8, 0);
        let next = advance(&rules, &state, &ask(InterrogationMethod::Deception, fumble()))
            .unwrap()
            .state;
        assert!(next.is_barred(InterrogationMethod::Deception));
        assert!(matches!(
            rules.check_for(&next, InterrogationMethod::Deception, 4),
            Err(DomainError::Constraint(_))
        ));

        let hostile = advance(&rules, &next, &ask(InterrogationMethod::BadCop, fumble())).unwrap();
        assert!(hostile.events.contains(&ConsequenceEvent::HostileChallenge));
        assert!(!hostile.state.is_barred(InterrogationMethod::BadCop));
    }

    #[test]
    fn test_check_spec_uses_strict_face_and_will_based_torture_dc() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 7, 0);
        let spec = rules
            .check_for(&state, InterrogationMethod::Torture, 5)
            .unwrap();
        assert_eq!(spec.success_face, 8);
        assert_eq!(spec.difficulty_class, 4);
        assert_eq!(rules.method_dc(&state, InterrogationMethod::Bribery), 1);
    }

    #[test]
    fn test_primary_method_tie_goes_to_first_used() {
        let rules = rules();
        let mut state = rules.open(EncounterId::new(), 9, 0);
        for method in [
            InterrogationMethod::Deception,
            InterrogationMethod::GoodCop,
            InterrogationMethod::GoodCop,
            InterrogationMethod::Deception,
        ] {
            state = advance(&rules, &state, &ask(method, failure())).unwrap().state;
        }
        assert_eq!(state.primary_method(), Some(InterrogationMethod::Deception));
        assert_eq!(rules.information_reliability(&state), Some(70));
    }

    #[test]
    fn test_session_resumes_after_serde() {
        let rules = rules();
        let state = rules.open(EncounterId::new(), 5, 0);
        let state = advance(&rules, &state, &ask(InterrogationMethod::GoodCop, success()))
            .unwrap()
            .state;
        let json = serde_json::to_string(&state).unwrap();
        let restored: InterrogationState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, state);
        assert_eq!(restored.minutes_elapsed, 30);
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_session() {
        let state = rules().open(EncounterId::new(), 5, 0);
        let json = serde_json::to_value(&state).unwrap();

        let mut regrown = json.clone();
        regrown["resistance"] = serde_json::json!(state.initial_resistance + 1);
        assert!(serde_json::from_value::<InterrogationState>(regrown).is_err());

        let mut over_cap = json.clone();
        over_cap["reliabilityCap"] = serde_json::json!(120);
        assert!(serde_json::from_value::<InterrogationState>(over_cap).is_err());

        let mut broken_early = json;
        broken_early["terminal"] = serde_json::json!({"outcome": "subjectBroken"});
        assert!(serde_json::from_value::<InterrogationState>(broken_early).is_err());
    }
}
