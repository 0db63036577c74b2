//! Engine error type.
//!
//! Wraps rule violations from the domain together with the I/O and parse
//! failures of loading rules tables.

use runeforge_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule rejected the request.
    #[error("Rules error: {0}")]
    Domain(#[from] DomainError),

    /// Reading a rules file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A rules file is not valid JSON for the tables.
    #[error("Rules file parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    /// True when the request was refused by a rule rather than by the host.
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, Self::Domain(_))
    }
}
