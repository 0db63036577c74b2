//! Unified error types for the domain layer
//!
//! Only programming errors travel through this type: invalid input at a call
//! boundary, advancing a finished encounter, or feeding an escalation tracker
//! that still owes a secondary check. Failures and fumbles are ordinary
//! results and never show up here.

use thiserror::Error;

use crate::escalation::{SecondaryCheck, TrackerKind};

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (e.g., negative pool size, out-of-range difficulty)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Business rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// State transition not allowed
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A tracker refused a delta because its mandatory check is unresolved
    #[error("{tracker} tracker is blocked until the pending {check} check is resolved")]
    SecondaryCheckPending {
        tracker: TrackerKind,
        check: SecondaryCheck,
    },
}

impl DomainError {
    /// Creates a validation error for rejected call-boundary input.
    ///
    /// # Example
    /// ```ignore
    /// if size < 0 {
    ///     return Err(DomainError::validation("pool size cannot be negative"));
    /// }
    /// ```
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    /// Create a blocked-tracker error
    pub fn secondary_check_pending(tracker: TrackerKind, check: SecondaryCheck) -> Self {
        Self::SecondaryCheckPending { tracker, check }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = DomainError::validation("pool size cannot be negative");
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "Validation failed: pool size cannot be negative"
        );
    }

    #[test]
    fn test_constraint_error() {
        let err = DomainError::constraint("character is lost");
        assert!(matches!(err, DomainError::Constraint(_)));
        assert_eq!(err.to_string(), "Constraint violation: character is lost");
    }

    #[test]
    fn test_invalid_state_transition_error() {
        let err = DomainError::invalid_state_transition("negotiation already ended");
        assert_eq!(
            err.to_string(),
            "Invalid state transition: negotiation already ended"
        );
    }

    #[test]
    fn test_secondary_check_pending_error() {
        let err = DomainError::secondary_check_pending(TrackerKind::Stress, SecondaryCheck::Trauma);
        assert!(matches!(err, DomainError::SecondaryCheckPending { .. }));
        assert_eq!(
            err.to_string(),
            "stress tracker is blocked until the pending trauma check is resolved"
        );
    }
}
