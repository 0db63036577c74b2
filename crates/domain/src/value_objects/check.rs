//! Skill check helpers layered on the resolver and classifier.

use serde::{Deserialize, Serialize};

use super::outcome::{CheckOutcome, MAX_DIFFICULTY_CLASS};
use crate::error::DomainError;

/// Situational modifiers applied before a check is rolled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillContext {
    /// Bonus (or penalty) dice
    pub dice_modifier: i32,
    /// Added to the difficulty class
    pub dc_modifier: i32,
}

impl SkillContext {
    pub fn new(dice_modifier: i32, dc_modifier: i32) -> Self {
        Self {
            dice_modifier,
            dc_modifier,
        }
    }

    /// Combine two contexts (e.g. tool bonus plus a status penalty).
    pub fn combine(self, other: SkillContext) -> Self {
        Self {
            dice_modifier: self.dice_modifier + other.dice_modifier,
            dc_modifier: self.dc_modifier + other.dc_modifier,
        }
    }

    /// Apply the modifiers to a base pool and difficulty.
    ///
    /// Penalties never strip a capable character of their last die; a pool
    /// that started at zero stays at zero.
    pub fn apply(&self, pool: u32, difficulty_class: i32) -> (u32, i32) {
        let floor = if pool > 0 { 1 } else { 0 };
        let modified = (i64::from(pool) + i64::from(self.dice_modifier)).max(floor);
        let pool = u32::try_from(modified).unwrap_or(u32::MAX);
        let dc = difficulty_class.saturating_add(self.dc_modifier).max(0);
        (pool, dc)
    }
}

/// Who won an opposed check and by how much.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "winner")]
pub enum ContestResult {
    Initiator { margin: i32 },
    Defender { margin: i32 },
}

impl ContestResult {
    pub fn initiator_won(&self) -> bool {
        matches!(self, Self::Initiator { .. })
    }
}

/// Opposed check: compare net successes, the initiator takes ties.
pub fn contest(initiator: &CheckOutcome, defender: &CheckOutcome) -> ContestResult {
    let margin = initiator.net_successes() - defender.net_successes();
    if margin >= 0 {
        ContestResult::Initiator { margin }
    } else {
        ContestResult::Defender { margin: -margin }
    }
}

/// Resistance ceiling unless the check is built with another.
pub const DEFAULT_MAX_RESISTANCE: u32 = 6;
/// Resistance at which a failed round stalls the check.
pub const STALL_RESISTANCE: u32 = 4;
/// Resistance shed when a stalled check is picked up again.
pub const RESUME_RESISTANCE_REDUCTION: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExtendedCheckStatus {
    InProgress,
    /// Paused until resumed; no rolls are accepted
    Stalled,
    Succeeded,
    Failed,
    Abandoned,
}

impl ExtendedCheckStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Abandoned)
    }
}

/// A check that accumulates successes over several rolls.
///
/// Each failed round hardens the opposition: `resistance` grows by
/// `resistance_step` half points and is added to `base_dc` for the next
/// roll. Hitting `max_resistance` with less than half the target banked
/// fails the check outright. Reaching the stall resistance pauses it until
/// [`ExtendedCheck::resume`] is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ExtendedCheckRecord")]
pub struct ExtendedCheck {
    pub target_successes: u32,
    pub max_rounds: u32,
    pub accumulated: u32,
    pub rounds: u32,
    pub base_dc: i32,
    pub resistance: u32,
    pub max_resistance: u32,
    /// Resistance gained per failed round, in half points
    pub resistance_step: u32,
    /// Half point left over from an odd step
    carry: u32,
    pub stall_reason: Option<String>,
    pub status: ExtendedCheckStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendedCheckRecord {
    target_successes: u32,
    max_rounds: u32,
    accumulated: u32,
    rounds: u32,
    #[serde(default)]
    base_dc: i32,
    #[serde(default)]
    resistance: u32,
    #[serde(default = "default_max_resistance")]
    max_resistance: u32,
    #[serde(default)]
    resistance_step: u32,
    #[serde(default)]
    carry: u32,
    #[serde(default)]
    stall_reason: Option<String>,
    status: ExtendedCheckStatus,
}

fn default_max_resistance() -> u32 {
    DEFAULT_MAX_RESISTANCE
}

impl TryFrom<ExtendedCheckRecord> for ExtendedCheck {
    type Error = DomainError;

    fn try_from(record: ExtendedCheckRecord) -> Result<Self, Self::Error> {
        let check = ExtendedCheck::new(record.target_successes, record.max_rounds)?
            .with_resistance(record.base_dc, record.resistance_step, record.max_resistance)?;
        if record.resistance > record.max_resistance || record.carry > 1 {
            return Err(DomainError::validation(format!(
                "resistance {} is outside 0..={}",
                record.resistance, record.max_resistance
            )));
        }
        if record.rounds > record.max_rounds {
            return Err(DomainError::validation(format!(
                "{} rounds played of {}",
                record.rounds, record.max_rounds
            )));
        }
        let reached = record.accumulated >= record.target_successes;
        let consistent = match record.status {
            ExtendedCheckStatus::Succeeded => reached,
            ExtendedCheckStatus::InProgress | ExtendedCheckStatus::Stalled => {
                !reached && record.rounds < record.max_rounds
            }
            ExtendedCheckStatus::Failed | ExtendedCheckStatus::Abandoned => !reached,
        };
        let stalled = record.status == ExtendedCheckStatus::Stalled;
        if !consistent || stalled != record.stall_reason.is_some() {
            return Err(DomainError::validation(format!(
                "status {:?} does not fit {}/{} successes after {} rounds",
                record.status, record.accumulated, record.target_successes, record.rounds
            )));
        }
        Ok(Self {
            accumulated: record.accumulated,
            rounds: record.rounds,
            resistance: record.resistance,
            carry: record.carry,
            stall_reason: record.stall_reason,
            status: record.status,
            ..check
        })
    }
}

impl ExtendedCheck {
    pub fn new(target_successes: u32, max_rounds: u32) -> Result<Self, DomainError> {
        if target_successes == 0 || max_rounds == 0 {
            return Err(DomainError::validation(
                "extended check needs a positive target and round limit",
            ));
        }
        Ok(Self {
            target_successes,
            max_rounds,
            accumulated: 0,
            rounds: 0,
            base_dc: 0,
            resistance: 0,
            max_resistance: DEFAULT_MAX_RESISTANCE,
            resistance_step: 0,
            carry: 0,
            stall_reason: None,
            status: ExtendedCheckStatus::InProgress,
        })
    }

    /// Roll against `base_dc`, hardening by `step` half points per failure.
    pub fn with_resistance(
        self,
        base_dc: i32,
        step: u32,
        max_resistance: u32,
    ) -> Result<Self, DomainError> {
        if !(0..=MAX_DIFFICULTY_CLASS).contains(&base_dc) {
            return Err(DomainError::validation(format!(
                "base DC {base_dc} outside 0..={MAX_DIFFICULTY_CLASS}"
            )));
        }
        Ok(Self {
            base_dc,
            resistance_step: step,
            max_resistance,
            ..self
        })
    }

    pub fn rounds_remaining(&self) -> u32 {
        self.max_rounds.saturating_sub(self.rounds)
    }

    /// DC the next roll must be made against.
    pub fn difficulty_class(&self) -> i32 {
        let resistance = i32::try_from(self.resistance).unwrap_or(MAX_DIFFICULTY_CLASS);
        self.base_dc
            .saturating_add(resistance)
            .min(MAX_DIFFICULTY_CLASS)
    }

    /// Fold one roll into the total.
    ///
    /// A success banks its net successes (at least one). A failure grows
    /// resistance, and a fumble also wipes the progress so far.
    pub fn record(&self, outcome: &CheckOutcome) -> Result<Self, DomainError> {
        self.ensure_in_progress()?;
        let dc = self.difficulty_class();
        if outcome.difficulty_class != dc {
            return Err(DomainError::validation(format!(
                "check was rolled against DC {}, extended check needs DC {dc}",
                outcome.difficulty_class
            )));
        }

        let mut next = self.clone();
        next.rounds += 1;
        let failed = !outcome.is_success();
        if failed {
            if outcome.is_fumble {
                next.accumulated = 0;
            }
            next.harden();
        } else {
            let gained = u32::try_from(outcome.net_successes().max(1)).unwrap_or(1);
            next.accumulated = next.accumulated.saturating_add(gained);
        }

        let below_half = next.accumulated.saturating_mul(2) < next.target_successes;
        if next.accumulated >= next.target_successes {
            next.status = ExtendedCheckStatus::Succeeded;
        } else if failed && next.resistance >= next.max_resistance && below_half {
            next.status = ExtendedCheckStatus::Failed;
        } else if next.rounds >= next.max_rounds {
            next.status = ExtendedCheckStatus::Failed;
        } else if failed && next.resistance >= STALL_RESISTANCE {
            next.status = ExtendedCheckStatus::Stalled;
            next.stall_reason = Some("resistance has hardened".to_string());
        }
        Ok(next)
    }

    /// Pause the check. Stalling an already stalled check replaces the reason.
    pub fn stall(&self, reason: impl Into<String>) -> Result<Self, DomainError> {
        if self.status.is_finished() {
            return Err(self.finished_error());
        }
        Ok(Self {
            status: ExtendedCheckStatus::Stalled,
            stall_reason: Some(reason.into()),
            ..self.clone()
        })
    }

    /// Pick a stalled check back up, shedding some resistance.
    pub fn resume(&self) -> Result<Self, DomainError> {
        if self.status != ExtendedCheckStatus::Stalled {
            return Err(DomainError::invalid_state_transition(format!(
                "only a stalled extended check can resume, this one is {:?}",
                self.status
            )));
        }
        Ok(Self {
            status: ExtendedCheckStatus::InProgress,
            resistance: self.resistance.saturating_sub(RESUME_RESISTANCE_REDUCTION),
            stall_reason: None,
            ..self.clone()
        })
    }

    pub fn abandon(&self) -> Result<Self, DomainError> {
        if self.status.is_finished() {
            return Err(self.finished_error());
        }
        Ok(Self {
            status: ExtendedCheckStatus::Abandoned,
            stall_reason: None,
            ..self.clone()
        })
    }

    fn harden(&mut self) {
        let halves = self.carry + self.resistance_step;
        self.carry = halves % 2;
        self.resistance = self
            .resistance
            .saturating_add(halves / 2)
            .min(self.max_resistance);
    }

    fn ensure_in_progress(&self) -> Result<(), DomainError> {
        match self.status {
            ExtendedCheckStatus::InProgress => Ok(()),
            ExtendedCheckStatus::Stalled => Err(DomainError::invalid_state_transition(
                "extended check is stalled, resume it first",
            )),
            _ => Err(self.finished_error()),
        }
    }

    fn finished_error(&self) -> DomainError {
        DomainError::invalid_state_transition(format!(
            "extended check already finished: {:?}",
            self.status
        ))
    }
}
