//! Stress scale: six bands on 0-100, a trauma check at the top.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    band_index, validate_thresholds, CheckResolution, EscalationScale, SecondaryCheck, TrackerKind,
};
use crate::error::DomainError;
use crate::events::ConsequenceEvent;

/// Stress bands, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StressThreshold {
    Calm,
    Uneasy,
    Anxious,
    Panicked,
    Breaking,
    Trauma,
}

impl StressThreshold {
    const ORDER: [StressThreshold; 6] = [
        Self::Calm,
        Self::Uneasy,
        Self::Anxious,
        Self::Panicked,
        Self::Breaking,
        Self::Trauma,
    ];
}

impl fmt::Display for StressThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Calm => "Calm",
            Self::Uneasy => "Uneasy",
            Self::Anxious => "Anxious",
            Self::Panicked => "Panicked",
            Self::Breaking => "Breaking",
            Self::Trauma => "Trauma",
        };
        write!(f, "{name}")
    }
}

/// Kinds of recovery a character can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestKind {
    Short,
    Long,
    /// Story milestone reached
    Milestone,
    /// Safe haven; clears all stress
    Sanctuary,
}

/// Stress thresholds and recovery constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StressScale {
    pub max: u32,
    /// Lower bounds of Uneasy, Anxious, Panicked, Breaking and Trauma
    pub thresholds: [u32; 5],
    pub reset_on_pass: u32,
    pub reset_on_fail: u32,
    pub disadvantage_at: u32,
    pub defense_step: u32,
    pub short_rest_will_multiplier: u32,
    pub long_rest_will_multiplier: u32,
    pub milestone_recovery: u32,
}

impl Default for StressScale {
    fn default() -> Self {
        Self {
            max: 100,
            thresholds: [20, 40, 60, 80, 100],
            reset_on_pass: 75,
            reset_on_fail: 50,
            disadvantage_at: 80,
            defense_step: 20,
            short_rest_will_multiplier: 2,
            long_rest_will_multiplier: 5,
            milestone_recovery: 25,
        }
    }
}

impl StressScale {
    /// Defense penalty: one point per full step of stress.
    pub fn defense_penalty(&self, stress: u32) -> u32 {
        stress.checked_div(self.defense_step).unwrap_or(0)
    }

    pub fn has_skill_disadvantage(&self, stress: u32) -> bool {
        stress >= self.disadvantage_at
    }

    /// Stress removed by a rest. Sanctuary clears everything.
    pub fn recovery_amount(&self, rest: RestKind, will: u32, current: u32) -> u32 {
        let amount = match rest {
            RestKind::Short => will.saturating_mul(self.short_rest_will_multiplier),
            RestKind::Long => will.saturating_mul(self.long_rest_will_multiplier),
            RestKind::Milestone => self.milestone_recovery,
            RestKind::Sanctuary => current,
        };
        amount.min(current)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_thresholds(TrackerKind::Stress, &self.thresholds, self.max)?;
        if self.reset_on_pass >= self.max || self.reset_on_fail >= self.max {
            return Err(DomainError::validation(
                "stress resets must land below the maximum",
            ));
        }
        if self.defense_step == 0 {
            return Err(DomainError::validation("stress defense step must be positive"));
        }
        Ok(())
    }
}

impl EscalationScale for StressScale {
    type Stage = StressThreshold;

    fn kind(&self) -> TrackerKind {
        TrackerKind::Stress
    }

    fn max(&self) -> u32 {
        self.max
    }

    fn stage_for(&self, value: u32) -> StressThreshold {
        StressThreshold::ORDER[band_index(&self.thresholds, value)]
    }

    fn secondary_check(&self) -> SecondaryCheck {
        SecondaryCheck::Trauma
    }

    fn resolve(&self, passed: bool) -> CheckResolution {
        if passed {
            CheckResolution {
                value: self.reset_on_pass,
                events: Vec::new(),
                lost: false,
            }
        } else {
            CheckResolution {
                value: self.reset_on_fail,
                events: vec![ConsequenceEvent::AcquireTrauma],
                lost: false,
            }
        }
    }
}

/// Stress left after a resistance check.
///
/// Net successes cut the incoming amount: 1 halves it, 2-3 remove three
/// quarters, 4 or more negate it. The reduction truncates.
pub fn resisted_stress(raw: u32, net_successes: i32) -> u32 {
    let percent = match net_successes {
        n if n <= 0 => 0,
        1 => 50,
        2..=3 => 75,
        _ => 100,
    };
    let removed = u64::from(raw) * percent / 100;
    raw - u32::try_from(removed).unwrap_or(raw)
}
