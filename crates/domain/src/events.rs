//! Consequence events
//!
//! Everything a rules step wants done to the outside world is returned as a
//! `ConsequenceEvent`. The rules never touch character records themselves;
//! the host interprets each event and applies it.

use serde::{Deserialize, Serialize};

use crate::escalation::{SecondaryCheck, TrackerKind};

/// Status conditions a rule can impose on a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusEffect {
    Stunned,
    Prone,
    Unconscious,
    /// Forced to move away from the source of panic
    Fleeing,
    /// Attacks the nearest creature, friend or foe
    Frenzied,
    /// Acts at random
    Disoriented,
    /// Refuses to act against what it has seen
    Denial,
}

/// Discrete consequence the host must apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum ConsequenceEvent {
    ApplyStress { amount: u32 },
    ApplyCorruption { amount: u32 },
    ReputationChange { amount: i32 },
    DispositionChange { amount: i32 },
    ApplyStatus { status: StatusEffect, turns: u32 },
    /// Roll `dice`d`faces` damage against the acting character
    Damage { dice: u32, faces: u8 },
    /// The counterpart or subject turns openly hostile
    HostileChallenge,
    AlarmTriggered,
    GrantSalvage { components: Vec<String> },
    RevealHints { hints: Vec<String> },
    RevealGlitch { glitched: bool },
    TimeSpent { minutes: u32 },
    BribePaid { amount: u32 },
    InformationExtracted { reliability: u8 },
    /// Mandatory check; the tracker refuses deltas until it is resolved
    SecondaryCheckRequired {
        tracker: TrackerKind,
        check: SecondaryCheck,
    },
    StageChanged {
        tracker: TrackerKind,
        from: String,
        to: String,
    },
    /// One-shot threshold crossed for the first time
    ThresholdReached { tracker: TrackerKind, threshold: u32 },
    FactionLocked,
    AcquireTrauma,
    PermanentMutation,
    /// The character is beyond saving and leaves player control
    CharacterLost,
}
