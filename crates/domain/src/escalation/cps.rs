//! Cognitive Paradox Syndrome
//!
//! CPS has no counter of its own: its stage is read straight off the stress
//! band, so it recovers as soon as stress does.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EscalationScale, EscalationState, StressScale, StressThreshold};
use crate::events::{ConsequenceEvent, StatusEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CpsStage {
    None,
    WeightOfKnowing,
    GlimmerMadness,
    RuinMadness,
    HollowShell,
}

impl CpsStage {
    pub fn from_stress(threshold: StressThreshold) -> Self {
        match threshold {
            StressThreshold::Calm => Self::None,
            StressThreshold::Uneasy => Self::WeightOfKnowing,
            StressThreshold::Anxious => Self::GlimmerMadness,
            StressThreshold::Panicked => Self::RuinMadness,
            StressThreshold::Breaking | StressThreshold::Trauma => Self::HollowShell,
        }
    }

    /// Below Ruin-Madness the mind still finds its way back unaided.
    pub fn is_recoverable(&self) -> bool {
        *self < Self::RuinMadness
    }

    pub fn allows_panic(&self) -> bool {
        *self >= Self::RuinMadness
    }
}

impl fmt::Display for CpsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::WeightOfKnowing => "Weight of Knowing",
            Self::GlimmerMadness => "Glimmer Madness",
            Self::RuinMadness => "Ruin-Madness",
            Self::HollowShell => "Hollow Shell",
        };
        write!(f, "{name}")
    }
}

/// CPS stage for a stress tracker.
pub fn cps_stage(stress: &EscalationState, scale: &StressScale) -> CpsStage {
    CpsStage::from_stress(scale.stage_for(stress.value()))
}

/// Panic table, one entry per d10 face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanicEffect {
    LogicLock,
    InvoluntaryScream,
    EvacuationProtocol,
    FetalPosition,
    SystemBlackout,
    RealityDenial,
    ParadoxFury,
    SystemCrash,
    RealityDrift,
    LuckyBreak,
}

impl PanicEffect {
    /// Table lookup; faces outside 1-10 are clamped onto the table.
    pub fn from_roll(face: i32) -> Self {
        match face.clamp(1, 10) {
            1 => Self::LogicLock,
            2 => Self::InvoluntaryScream,
            3 => Self::EvacuationProtocol,
            4 => Self::FetalPosition,
            5 => Self::SystemBlackout,
            6 => Self::RealityDenial,
            7 => Self::ParadoxFury,
            8 => Self::SystemCrash,
            9 => Self::RealityDrift,
            _ => Self::LuckyBreak,
        }
    }

    pub fn events(&self) -> Vec<ConsequenceEvent> {
        let status = |status, turns| ConsequenceEvent::ApplyStatus { status, turns };
        match self {
            Self::LogicLock => vec![status(StatusEffect::Stunned, 1)],
            Self::InvoluntaryScream => vec![ConsequenceEvent::AlarmTriggered],
            Self::EvacuationProtocol => vec![status(StatusEffect::Fleeing, 1)],
            Self::FetalPosition => vec![status(StatusEffect::Prone, 1)],
            Self::SystemBlackout => vec![status(StatusEffect::Unconscious, 2)],
            Self::RealityDenial => vec![status(StatusEffect::Denial, 2)],
            Self::ParadoxFury => vec![status(StatusEffect::Frenzied, 1)],
            Self::SystemCrash => vec![
                status(StatusEffect::Prone, 1),
                status(StatusEffect::Stunned, 1),
            ],
            Self::RealityDrift => vec![status(StatusEffect::Disoriented, 1)],
            Self::LuckyBreak => Vec::new(),
        }
    }
}

/// Roll on the panic table. Stages below Ruin-Madness never panic and
/// consume no randomness.
pub fn roll_panic(
    stage: CpsStage,
    mut roll_die: impl FnMut(i32, i32) -> i32,
) -> Option<PanicEffect> {
    if !stage.allows_panic() {
        return None;
    }
    Some(PanicEffect::from_roll(roll_die(1, 10)))
}
