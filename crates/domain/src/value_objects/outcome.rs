//! Outcome classification
//!
//! Turns a rolled pool and a difficulty class into one of six tiers. The
//! fumble test always runs first: zero successes with at least one botch is
//! a critical failure no matter how low the difficulty is. Only a roll that
//! is not a fumble gets tiered by margin.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::dice::RollResult;
use crate::error::DomainError;

/// Highest difficulty class a check may ask for.
pub const MAX_DIFFICULTY_CLASS: i32 = 20;

/// The six outcome tiers, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutcomeTier {
    /// Fumble - zero successes and at least one botch
    CriticalFailure,
    /// Margin below zero
    Failure,
    /// Margin exactly zero
    MarginalSuccess,
    /// Margin 1-2
    FullSuccess,
    /// Margin 3-4
    ExceptionalSuccess,
    /// Margin 5 or more
    CriticalSuccess,
}

impl OutcomeTier {
    /// Tier for a non-fumble roll.
    pub fn from_margin(margin: i32) -> Self {
        match margin {
            m if m < 0 => Self::Failure,
            0 => Self::MarginalSuccess,
            1..=2 => Self::FullSuccess,
            3..=4 => Self::ExceptionalSuccess,
            _ => Self::CriticalSuccess,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::MarginalSuccess
                | Self::FullSuccess
                | Self::ExceptionalSuccess
                | Self::CriticalSuccess
        )
    }

    pub fn is_critical_failure(&self) -> bool {
        matches!(self, Self::CriticalFailure)
    }

    /// Critical or exceptional success
    pub fn is_strong_success(&self) -> bool {
        matches!(self, Self::ExceptionalSuccess | Self::CriticalSuccess)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::CriticalFailure => "Critical Failure",
            Self::Failure => "Failure",
            Self::MarginalSuccess => "Marginal Success",
            Self::FullSuccess => "Full Success",
            Self::ExceptionalSuccess => "Exceptional Success",
            Self::CriticalSuccess => "Critical Success",
        }
    }
}

impl fmt::Display for OutcomeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A classified check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "CheckOutcomeRecord")]
pub struct CheckOutcome {
    pub successes: u32,
    pub botches: u32,
    pub difficulty_class: i32,
    /// `successes - difficulty_class`
    pub margin: i32,
    pub is_fumble: bool,
    pub tier: OutcomeTier,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckOutcomeRecord {
    successes: u32,
    botches: u32,
    difficulty_class: i32,
    margin: i32,
    is_fumble: bool,
    tier: OutcomeTier,
}

/// Derived fields are recomputed from the counts and must match.
impl TryFrom<CheckOutcomeRecord> for CheckOutcome {
    type Error = DomainError;

    fn try_from(record: CheckOutcomeRecord) -> Result<Self, Self::Error> {
        let outcome = Self::from_counts(record.successes, record.botches, record.difficulty_class)?;
        let recorded = (record.margin, record.is_fumble, record.tier);
        if recorded != (outcome.margin, outcome.is_fumble, outcome.tier) {
            return Err(DomainError::validation(format!(
                "recorded {} does not follow from {} successes and {} botches at DC {}",
                record.tier, record.successes, record.botches, record.difficulty_class
            )));
        }
        Ok(outcome)
    }
}

impl CheckOutcome {
    /// Classify raw counts against a difficulty class.
    pub fn from_counts(
        successes: u32,
        botches: u32,
        difficulty_class: i32,
    ) -> Result<Self, DomainError> {
        if !(0..=MAX_DIFFICULTY_CLASS).contains(&difficulty_class) {
            return Err(DomainError::validation(format!(
                "difficulty class {difficulty_class} outside 0..={MAX_DIFFICULTY_CLASS}"
            )));
        }

        let margin = i32::try_from(successes).unwrap_or(i32::MAX) - difficulty_class;
        let is_fumble = successes == 0 && botches >= 1;
        let tier = if is_fumble {
            OutcomeTier::CriticalFailure
        } else {
            OutcomeTier::from_margin(margin)
        };

        Ok(Self {
            successes,
            botches,
            difficulty_class,
            margin,
            is_fumble,
            tier,
        })
    }

    pub fn is_success(&self) -> bool {
        self.tier.is_success()
    }

    /// Successes minus botches, used when two checks are compared head to head.
    pub fn net_successes(&self) -> i32 {
        i32::try_from(self.successes).unwrap_or(i32::MAX)
            - i32::try_from(self.botches).unwrap_or(i32::MAX)
    }
}

/// Classify a rolled pool against a difficulty class.
pub fn classify(roll: &RollResult, difficulty_class: i32) -> Result<CheckOutcome, DomainError> {
    CheckOutcome::from_counts(roll.success_count(), roll.botch_count(), difficulty_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::dice::tests::scripted;
    use crate::value_objects::dice::{roll, DicePool};

    #[test]
    fn test_fumble_overrides_margin_at_any_dc() {
        for dc in 0..=MAX_DIFFICULTY_CLASS {
            let outcome = CheckOutcome::from_counts(0, 1, dc).unwrap();
            assert!(outcome.is_fumble);
            assert_eq!(outcome.tier, OutcomeTier::CriticalFailure);
        }
    }

    #[test]
    fn test_dc_zero_can_be_fumbled() {
        let result = DicePool::standard(3).roll(scripted(&[1, 4, 5]));
        let outcome = classify(&result, 0).unwrap();
        assert_eq!(outcome.tier, OutcomeTier::CriticalFailure);
    }

    #[test]
    fn test_zero_successes_without_botch_is_not_fumble() {
        let outcome = CheckOutcome::from_counts(0, 0, 0).unwrap();
        assert!(!outcome.is_fumble);
        assert_eq!(outcome.tier, OutcomeTier::MarginalSuccess);
    }

    #[test]
    fn test_margin_boundaries() {
        let cases = [
            (0, 1, OutcomeTier::Failure),
            (1, 2, OutcomeTier::Failure),
            (2, 2, OutcomeTier::MarginalSuccess),
            (3, 2, OutcomeTier::FullSuccess),
            (4, 2, OutcomeTier::FullSuccess),
            (5, 2, OutcomeTier::ExceptionalSuccess),
            (6, 2, OutcomeTier::ExceptionalSuccess),
            (7, 2, OutcomeTier::CriticalSuccess),
            (12, 0, OutcomeTier::CriticalSuccess),
        ];
        for (successes, dc, expected) in cases {
            let outcome = CheckOutcome::from_counts(successes, 0, dc).unwrap();
            assert_eq!(outcome.tier, expected, "successes={successes} dc={dc}");
        }
    }

    #[test]
    fn test_mixed_roll_is_not_fumble() {
        let result = roll(5, 7, 1, scripted(&[1, 2, 3, 4, 9])).unwrap();
        for dc in 0..=3 {
            let outcome = classify(&result, dc).unwrap();
            assert!(!outcome.is_fumble);
            assert_eq!(outcome.margin, 1 - dc);
        }
        assert_eq!(classify(&result, 1).unwrap().tier, OutcomeTier::MarginalSuccess);
        assert_eq!(classify(&result, 2).unwrap().tier, OutcomeTier::Failure);
    }

    #[test]
    fn test_out_of_range_dc_rejected() {
        assert!(CheckOutcome::from_counts(1, 0, -1).is_err());
        assert!(CheckOutcome::from_counts(1, 0, MAX_DIFFICULTY_CLASS + 1).is_err());
    }

    #[test]
    fn test_classification_is_deterministic() {
        let result = DicePool::standard(4).roll(scripted(&[7, 8, 2, 1]));
        assert_eq!(classify(&result, 1).unwrap(), classify(&result, 1).unwrap());
    }

    #[test]
    fn test_tier_ordering_and_predicates() {
        assert!(OutcomeTier::CriticalFailure < OutcomeTier::Failure);
        assert!(OutcomeTier::ExceptionalSuccess.is_strong_success());
        assert!(!OutcomeTier::FullSuccess.is_strong_success());
        assert!(!OutcomeTier::Failure.is_success());
        assert_eq!(OutcomeTier::MarginalSuccess.to_string(), "Marginal Success");
    }

    #[test]
    fn test_deserialize_recomputes_tier() {
        let outcome = CheckOutcome::from_counts(3, 0, 1).unwrap();
        let mut value = serde_json::to_value(outcome).unwrap();
        assert_eq!(serde_json::from_value::<CheckOutcome>(value.clone()).unwrap(), outcome);

        value["tier"] = serde_json::json!("criticalSuccess");
        assert!(serde_json::from_value::<CheckOutcome>(value.clone()).is_err());

        let mut fumble = serde_json::to_value(CheckOutcome::from_counts(0, 2, 3).unwrap()).unwrap();
        fumble["isFumble"] = serde_json::json!(false);
        fumble["tier"] = serde_json::json!("failure");
        assert!(serde_json::from_value::<CheckOutcome>(fumble).is_err());

        value = serde_json::to_value(outcome).unwrap();
        value["difficultyClass"] = serde_json::json!(25);
        value["margin"] = serde_json::json!(-22);
        assert!(serde_json::from_value::<CheckOutcome>(value).is_err());
    }
}
