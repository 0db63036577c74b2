//! Value objects - Immutable objects defined by their attributes

mod check;
pub(crate) mod dice;
mod outcome;

// Dice pools and raw roll data
pub use dice::{
    roll, DiceConfig, DicePool, FaceKind, ModeRoll, RollMode, RollResult, DEFAULT_BOTCH_FACE,
    DEFAULT_FACES, DEFAULT_SUCCESS_FACE,
};

// Outcome tiers
pub use outcome::{classify, CheckOutcome, OutcomeTier, MAX_DIFFICULTY_CLASS};

// Situational modifiers, opposed and extended checks
pub use check::{
    contest, ContestResult, ExtendedCheck, ExtendedCheckStatus, SkillContext,
    DEFAULT_MAX_RESISTANCE, RESUME_RESISTANCE_REDUCTION, STALL_RESISTANCE,
};
