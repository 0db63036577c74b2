//! Runeforge domain: dice resolution, escalation trackers and encounter
//! state machines.
//!
//! Nothing in here performs I/O, logs, or owns a random number generator.
//! Rolls take a `FnMut(i32, i32) -> i32` returning an inclusive value, and
//! every controller returns new state plus the consequences for the host.

pub mod config;
pub mod encounters;
pub mod error;
pub mod escalation;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use config::RulesConfig;
pub use error::DomainError;
pub use events::{ConsequenceEvent, StatusEffect};
pub use ids::EncounterId;

// Generic encounter machinery
pub use encounters::{advance, Advance, CheckSpec, EncounterMachine, EncounterState};

// Encounter controllers
pub use encounters::interrogation::{
    AbandonReason, InterrogationAction, InterrogationConfig, InterrogationFumble,
    InterrogationMethod, InterrogationPhase, InterrogationRules, InterrogationState,
    InterrogationTerminal, ResistanceLevel,
};
pub use encounters::jury_rig::{
    BypassMethod, Complication, JuryRigAction, JuryRigConfig, JuryRigRules, JuryRigState,
    JuryRigStatus, JuryRigStep, JuryRigTerminal, MechanismKind,
};
pub use encounters::negotiation::{
    CollapseReason, ConcessionKind, NegotiationAction, NegotiationConfig, NegotiationPhase,
    NegotiationRules, NegotiationState, NegotiationTactic, NegotiationTerminal,
    RequestComplexity,
};

// Escalation trackers
pub use escalation::{
    cps_stage, resisted_stress, roll_panic, CorruptionScale, CorruptionStage, CpsStage,
    EscalationReport, EscalationScale, EscalationState, PanicEffect, RestKind, SecondaryCheck,
    StressScale, StressThreshold, TrackerKind,
};

// Value objects (explicit list in value_objects/mod.rs)
pub use value_objects::{
    classify, contest, roll, CheckOutcome, ContestResult, DiceConfig, DicePool, ExtendedCheck,
    ExtendedCheckStatus, FaceKind, ModeRoll, OutcomeTier, RollMode, RollResult, SkillContext,
    DEFAULT_BOTCH_FACE, DEFAULT_FACES, DEFAULT_MAX_RESISTANCE, DEFAULT_SUCCESS_FACE,
    MAX_DIFFICULTY_CLASS, RESUME_RESISTANCE_REDUCTION, STALL_RESISTANCE,
};
