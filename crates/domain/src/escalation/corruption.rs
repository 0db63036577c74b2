//! Corruption scale
//!
//! Corruption never drains on its own. Crossing 25, 50 and 75 fires once per
//! character; 50 also locks the character out of faction standing. At 100
//! the character must pass a mutation check or be lost.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{
    band_index, validate_thresholds, CheckResolution, EscalationScale, SecondaryCheck, TrackerKind,
};
use crate::error::DomainError;
use crate::events::ConsequenceEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CorruptionStage {
    Uncorrupted,
    Tainted,
    Infected,
    Blighted,
    Corrupted,
    Consumed,
}

impl CorruptionStage {
    const ORDER: [CorruptionStage; 6] = [
        Self::Uncorrupted,
        Self::Tainted,
        Self::Infected,
        Self::Blighted,
        Self::Corrupted,
        Self::Consumed,
    ];

    /// Bonus dice on technology checks.
    pub fn tech_bonus(&self) -> u32 {
        match self {
            Self::Uncorrupted | Self::Consumed => 0,
            Self::Tainted => 1,
            Self::Infected | Self::Blighted | Self::Corrupted => 2,
        }
    }

    /// Dice lost on social checks (as a negative modifier).
    pub fn social_penalty(&self) -> i32 {
        match self {
            Self::Uncorrupted | Self::Consumed => 0,
            Self::Tainted => -1,
            Self::Infected | Self::Blighted | Self::Corrupted => -2,
        }
    }
}

impl fmt::Display for CorruptionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uncorrupted => "Uncorrupted",
            Self::Tainted => "Tainted",
            Self::Infected => "Infected",
            Self::Blighted => "Blighted",
            Self::Corrupted => "Corrupted",
            Self::Consumed => "Consumed",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorruptionScale {
    pub max: u32,
    /// Lower bounds of Tainted, Infected, Blighted, Corrupted and Consumed
    pub thresholds: [u32; 5],
    pub one_shot_thresholds: Vec<u32>,
    pub faction_lock_at: u32,
    pub mutation_risk_at: u32,
    /// Value after a passed mutation check
    pub reset_on_pass: u32,
}

impl Default for CorruptionScale {
    fn default() -> Self {
        Self {
            max: 100,
            thresholds: [20, 40, 60, 80, 100],
            one_shot_thresholds: vec![25, 50, 75],
            faction_lock_at: 50,
            mutation_risk_at: 80,
            reset_on_pass: 90,
        }
    }
}

impl CorruptionScale {
    pub fn is_faction_locked(&self, corruption: u32) -> bool {
        corruption >= self.faction_lock_at
    }

    pub fn has_mutation_risk(&self, corruption: u32) -> bool {
        corruption >= self.mutation_risk_at
    }

    /// Percent taken off max HP and AP: 5% per full 10 points.
    pub fn max_resource_penalty_percent(&self, corruption: u32) -> u32 {
        (corruption.min(self.max) / 10) * 5
    }

    /// Dice lost on Resolve checks: one per full 20 points.
    pub fn resolve_dice_penalty(&self, corruption: u32) -> u32 {
        corruption.min(self.max) / 20
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_thresholds(TrackerKind::Corruption, &self.thresholds, self.max)?;
        if self.reset_on_pass >= self.max {
            return Err(DomainError::validation(
                "corruption reset must land below the maximum",
            ));
        }
        if self.one_shot_thresholds.iter().any(|&t| t == 0 || t > self.max) {
            return Err(DomainError::validation(
                "corruption one-shot thresholds must sit within the scale",
            ));
        }
        Ok(())
    }
}

impl EscalationScale for CorruptionScale {
    type Stage = CorruptionStage;

    fn kind(&self) -> TrackerKind {
        TrackerKind::Corruption
    }

    fn max(&self) -> u32 {
        self.max
    }

    fn stage_for(&self, value: u32) -> CorruptionStage {
        CorruptionStage::ORDER[band_index(&self.thresholds, value)]
    }

    fn secondary_check(&self) -> SecondaryCheck {
        SecondaryCheck::Mutation
    }

    fn resolve(&self, passed: bool) -> CheckResolution {
        if passed {
            CheckResolution {
                value: self.reset_on_pass,
                events: vec![ConsequenceEvent::PermanentMutation],
                lost: false,
            }
        } else {
            CheckResolution {
                value: self.max,
                events: vec![ConsequenceEvent::CharacterLost],
                lost: true,
            }
        }
    }

    fn one_shot_thresholds(&self) -> &[u32] {
        &self.one_shot_thresholds
    }

    fn threshold_events(&self, threshold: u32) -> Vec<ConsequenceEvent> {
        if threshold == self.faction_lock_at {
            vec![ConsequenceEvent::FactionLocked]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainError;
    use crate::escalation::EscalationState;

    #[test]
    fn test_stage_bands() {
        let scale = CorruptionScale::default();
        assert_eq!(scale.stage_for(0), CorruptionStage::Uncorrupted);
        assert_eq!(scale.stage_for(20), CorruptionStage::Tainted);
        assert_eq!(scale.stage_for(59), CorruptionStage::Infected);
        assert_eq!(scale.stage_for(60), CorruptionStage::Blighted);
        assert_eq!(scale.stage_for(80), CorruptionStage::Corrupted);
        assert_eq!(scale.stage_for(100), CorruptionStage::Consumed);
    }

    #[test]
    fn test_one_shot_thresholds_fire_once() {
        let scale = CorruptionScale::default();
        let mut state = EscalationState::new(TrackerKind::Corruption);

        let report = state.apply(&scale, 52, "rift exposure").unwrap();
        assert!(report.events.contains(&ConsequenceEvent::ThresholdReached {
            tracker: TrackerKind::Corruption,
            threshold: 25,
        }));
        assert!(report.events.contains(&ConsequenceEvent::FactionLocked));

        state.apply(&scale, -30, "purge").unwrap();
        let report = state.apply(&scale, 30, "relapse").unwrap();
        assert!(!report
            .events
            .iter()
            .any(|e| matches!(e, ConsequenceEvent::ThresholdReached { .. })));
        assert!(!report.events.contains(&ConsequenceEvent::FactionLocked));
    }

    #[test]
    fn test_mutation_check_pass() {
        let scale = CorruptionScale::default();
        let mut state = EscalationState::new(TrackerKind::Corruption);
        let report = state.apply(&scale, 100, "heart of the blight").unwrap();
        assert!(report.events.contains(&ConsequenceEvent::SecondaryCheckRequired {
            tracker: TrackerKind::Corruption,
            check: SecondaryCheck::Mutation,
        }));

        let report = state.resolve_secondary_check(&scale, true).unwrap();
        assert_eq!(report.value, 90);
        assert_eq!(report.stage, CorruptionStage::Corrupted);
        assert!(report.events.contains(&ConsequenceEvent::PermanentMutation));
        assert!(!state.is_lost());
    }

    #[test]
    fn test_mutation_check_fail_loses_character() {
        let scale = CorruptionScale::default();
        let mut state = EscalationState::new(TrackerKind::Corruption);
        state.apply(&scale, 100, "heart of the blight").unwrap();

        let report = state.resolve_secondary_check(&scale, false).unwrap();
        assert!(report.events.contains(&ConsequenceEvent::CharacterLost));
        assert!(state.is_lost());
        assert!(matches!(
            state.apply(&scale, -10, "cleansing"),
            Err(DomainError::Constraint(_))
        ));
    }

    #[test]
    fn test_penalties() {
        let scale = CorruptionScale::default();
        assert_eq!(scale.max_resource_penalty_percent(0), 0);
        assert_eq!(scale.max_resource_penalty_percent(39), 15);
        assert_eq!(scale.max_resource_penalty_percent(100), 50);
        assert_eq!(scale.resolve_dice_penalty(59), 2);
        assert!(scale.is_faction_locked(50));
        assert!(!scale.has_mutation_risk(79));
        assert!(scale.has_mutation_risk(80));
    }

    #[test]
    fn test_stage_modifiers() {
        assert_eq!(CorruptionStage::Uncorrupted.tech_bonus(), 0);
        assert_eq!(CorruptionStage::Tainted.tech_bonus(), 1);
        assert_eq!(CorruptionStage::Corrupted.tech_bonus(), 2);
        assert_eq!(CorruptionStage::Consumed.tech_bonus(), 0);
        assert_eq!(CorruptionStage::Infected.social_penalty(), -2);
        assert_eq!(CorruptionStage::Consumed.social_penalty(), 0);
    }
}
