//! Use cases: roll, classify, advance.
//!
//! Each module drives one rules area through the domain controllers and
//! owns the logging for it.

pub mod check;
pub mod encounter;
pub mod escalation;
pub mod interrogation;
pub mod jury_rig;
pub mod negotiation;

pub use check::{CheckReport, CheckRequest, ContestReport, RollCheck};
pub use encounter::EncounterTurn;
pub use escalation::{EscalationOutcome, TrackEscalation};
pub use interrogation::RunInterrogation;
pub use jury_rig::RunJuryRig;
pub use negotiation::{NegotiationMove, PlayNegotiation};
