//! Escalation trackers
//!
//! A tracker is a bounded counter (stress, corruption) whose stage is a pure
//! step function of its value. Reaching the top of the scale demands a
//! secondary check; until the host resolves it the tracker refuses every
//! further delta.

mod corruption;
mod cps;
mod stress;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::events::ConsequenceEvent;

pub use corruption::{CorruptionScale, CorruptionStage};
pub use cps::{cps_stage, roll_panic, CpsStage, PanicEffect};
pub use stress::{resisted_stress, RestKind, StressScale, StressThreshold};

/// Which quantity a tracker follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackerKind {
    Stress,
    Corruption,
}

impl TrackerKind {
    /// The check a maxed-out tracker of this kind demands.
    pub fn secondary_check(&self) -> SecondaryCheck {
        match self {
            Self::Stress => SecondaryCheck::Trauma,
            Self::Corruption => SecondaryCheck::Mutation,
        }
    }
}

impl fmt::Display for TrackerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stress => write!(f, "stress"),
            Self::Corruption => write!(f, "corruption"),
        }
    }
}

/// Mandatory check raised when a tracker maxes out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SecondaryCheck {
    /// Stress at maximum
    Trauma,
    /// Corruption at maximum
    Mutation,
}

impl fmt::Display for SecondaryCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trauma => write!(f, "trauma"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// What a resolved secondary check does to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResolution {
    pub value: u32,
    pub events: Vec<ConsequenceEvent>,
    /// The character is gone; the tracker accepts nothing afterwards
    pub lost: bool,
}

/// Threshold table and secondary-check rules for one tracked quantity.
pub trait EscalationScale {
    type Stage: Copy + Eq + fmt::Debug + fmt::Display;

    fn kind(&self) -> TrackerKind;

    fn max(&self) -> u32;

    /// Monotonic step function from value to stage.
    fn stage_for(&self, value: u32) -> Self::Stage;

    fn secondary_check(&self) -> SecondaryCheck;

    fn resolve(&self, passed: bool) -> CheckResolution;

    /// Thresholds that fire once per character lifetime.
    fn one_shot_thresholds(&self) -> &[u32] {
        &[]
    }

    /// Extra consequences when a one-shot threshold fires.
    fn threshold_events(&self, _threshold: u32) -> Vec<ConsequenceEvent> {
        Vec::new()
    }
}

/// One contribution to a tracker, kept forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationEntry {
    pub source: String,
    pub delta: i32,
    pub value_after: u32,
}

/// Persistent tracker value owned by a character record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EscalationStateRecord")]
pub struct EscalationState {
    kind: TrackerKind,
    value: u32,
    pending_check: Option<SecondaryCheck>,
    triggered_thresholds: Vec<u32>,
    lost: bool,
    history: Vec<EscalationEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EscalationStateRecord {
    kind: TrackerKind,
    value: u32,
    pending_check: Option<SecondaryCheck>,
    triggered_thresholds: Vec<u32>,
    lost: bool,
    history: Vec<EscalationEntry>,
}

/// The value must be the one the history ends on.
impl TryFrom<EscalationStateRecord> for EscalationState {
    type Error = DomainError;

    fn try_from(record: EscalationStateRecord) -> Result<Self, Self::Error> {
        let expected = record.kind.secondary_check();
        let bad_check = record.pending_check.filter(|check| *check != expected || record.lost);
        if let Some(check) = bad_check {
            return Err(DomainError::validation(format!(
                "{} tracker cannot be waiting on a {check} check",
                record.kind
            )));
        }
        let recorded = record.history.last().map_or(0, |entry| entry.value_after);
        if recorded != record.value {
            return Err(DomainError::validation(format!(
                "{} tracker is at {} but its history ends at {recorded}",
                record.kind, record.value
            )));
        }
        Ok(Self {
            kind: record.kind,
            value: record.value,
            pending_check: record.pending_check,
            triggered_thresholds: record.triggered_thresholds,
            lost: record.lost,
            history: record.history,
        })
    }
}

/// Result of a delta or a resolved check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscalationReport<S> {
    pub previous: u32,
    pub value: u32,
    pub previous_stage: S,
    pub stage: S,
    pub crossed_stage: bool,
    pub events: Vec<ConsequenceEvent>,
}

impl EscalationState {
    /// Fresh tracker at zero.
    pub fn new(kind: TrackerKind) -> Self {
        Self {
            kind,
            value: 0,
            pending_check: None,
            triggered_thresholds: Vec::new(),
            lost: false,
            history: Vec::new(),
        }
    }

    pub fn kind(&self) -> TrackerKind {
        self.kind
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn pending_check(&self) -> Option<SecondaryCheck> {
        self.pending_check
    }

    pub fn is_blocked(&self) -> bool {
        self.pending_check.is_some()
    }

    pub fn is_lost(&self) -> bool {
        self.lost
    }

    pub fn history(&self) -> &[EscalationEntry] {
        &self.history
    }

    pub fn triggered_thresholds(&self) -> &[u32] {
        &self.triggered_thresholds
    }

    /// Stage derived from the current value.
    pub fn stage<S: EscalationScale>(&self, scale: &S) -> S::Stage {
        scale.stage_for(self.value)
    }

    /// Apply a signed delta, clamped to `[0, max]`.
    ///
    /// Refused with [`DomainError::SecondaryCheckPending`] while a secondary
    /// check is outstanding; the state is left untouched in that case.
    pub fn apply<S: EscalationScale>(
        &mut self,
        scale: &S,
        delta: i32,
        source: impl Into<String>,
    ) -> Result<EscalationReport<S::Stage>, DomainError> {
        self.ensure_scale(scale)?;
        if self.lost {
            return Err(DomainError::constraint(format!(
                "{} tracker belongs to a lost character",
                self.kind
            )));
        }
        if let Some(check) = self.pending_check {
            return Err(DomainError::secondary_check_pending(self.kind, check));
        }

        let previous = self.value;
        let max = i64::from(scale.max());
        let next = (i64::from(previous) + i64::from(delta)).clamp(0, max);
        let value = u32::try_from(next).unwrap_or(0);
        self.value = value;
        self.history.push(EscalationEntry {
            source: source.into(),
            delta,
            value_after: value,
        });

        let mut events = self.stage_events(scale, previous);

        for &threshold in scale.one_shot_thresholds() {
            if previous < threshold
                && value >= threshold
                && !self.triggered_thresholds.contains(&threshold)
            {
                self.triggered_thresholds.push(threshold);
                events.push(ConsequenceEvent::ThresholdReached {
                    tracker: self.kind,
                    threshold,
                });
                events.extend(scale.threshold_events(threshold));
            }
        }

        if value >= scale.max() {
            let check = scale.secondary_check();
            self.pending_check = Some(check);
            events.push(ConsequenceEvent::SecondaryCheckRequired {
                tracker: self.kind,
                check,
            });
        }

        Ok(self.report(scale, previous, events))
    }

    /// Clear the pending check with its result.
    pub fn resolve_secondary_check<S: EscalationScale>(
        &mut self,
        scale: &S,
        passed: bool,
    ) -> Result<EscalationReport<S::Stage>, DomainError> {
        self.ensure_scale(scale)?;
        let check = self.pending_check.ok_or_else(|| {
            DomainError::invalid_state_transition(format!(
                "{} tracker has no pending secondary check",
                self.kind
            ))
        })?;

        let previous = self.value;
        let resolution = scale.resolve(passed);
        self.pending_check = None;
        self.lost = resolution.lost;
        self.value = resolution.value.min(scale.max());
        self.history.push(EscalationEntry {
            source: format!(
                "{} check {}",
                check,
                if passed { "passed" } else { "failed" }
            ),
            delta: i64::from(self.value)
                .checked_sub(i64::from(previous))
                .and_then(|d| i32::try_from(d).ok())
                .unwrap_or(0),
            value_after: self.value,
        });

        let mut events = self.stage_events(scale, previous);
        events.extend(resolution.events);
        Ok(self.report(scale, previous, events))
    }

    fn stage_events<S: EscalationScale>(&self, scale: &S, previous: u32) -> Vec<ConsequenceEvent> {
        let from = scale.stage_for(previous);
        let to = scale.stage_for(self.value);
        if from == to {
            return Vec::new();
        }
        vec![ConsequenceEvent::StageChanged {
            tracker: self.kind,
            from: from.to_string(),
            to: to.to_string(),
        }]
    }

    fn report<S: EscalationScale>(
        &self,
        scale: &S,
        previous: u32,
        events: Vec<ConsequenceEvent>,
    ) -> EscalationReport<S::Stage> {
        let previous_stage = scale.stage_for(previous);
        let stage = scale.stage_for(self.value);
        EscalationReport {
            previous,
            value: self.value,
            previous_stage,
            stage,
            crossed_stage: previous_stage != stage,
            events,
        }
    }

    fn ensure_scale<S: EscalationScale>(&self, scale: &S) -> Result<(), DomainError> {
        if scale.kind() != self.kind {
            return Err(DomainError::validation(format!(
                "{} scale cannot drive a {} tracker",
                scale.kind(),
                self.kind
            )));
        }
        Ok(())
    }
}

/// Count how many ascending thresholds `value` has reached.
pub(crate) fn band_index(thresholds: &[u32], value: u32) -> usize {
    thresholds.iter().take_while(|&&t| value >= t).count()
}

/// Thresholds must rise strictly and end at the scale maximum.
pub(crate) fn validate_thresholds(
    kind: TrackerKind,
    thresholds: &[u32],
    max: u32,
) -> Result<(), DomainError> {
    let ascending = thresholds.windows(2).all(|w| w[0] < w[1]);
    if !ascending || thresholds.last() != Some(&max) {
        return Err(DomainError::validation(format!(
            "{kind} thresholds must rise strictly and end at {max}"
        )));
    }
    Ok(())
}
