//! Error types for the dispatch engine
//!
//! Only malformed input and impossible transitions are errors. An empty
//! pool or a held mission gate is reported through the typed outcomes in
//! [`crate::engine`], never through [`DispatchError`].

use crate::occurrence::{OccurrenceId, OccurrenceStatus};
use sentinel_core_resilience::ResilienceError;
use thiserror::Error;

/// Result type alias for dispatch operations
pub type Result<T> = std::result::Result<T, DispatchError>;

/// Errors raised at the engine boundary
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// Malformed or out-of-range location input
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Severity outside 1..=5
    #[error("invalid severity {0}: expected a value between 1 and 5")]
    InvalidSeverity(i64),

    /// Blank region name
    #[error("invalid region name: {0:?}")]
    InvalidRegion(String),

    /// No occurrence with this id
    #[error("unknown occurrence {0}")]
    UnknownOccurrence(OccurrenceId),

    /// State machine refused the move
    #[error("occurrence {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: OccurrenceId,
        from: OccurrenceStatus,
        to: OccurrenceStatus,
    },

    /// Contact failed validation
    #[error("invalid contact: {0}")]
    InvalidContact(String),

    /// Engine configuration rejected
    #[error("configuration error: {0}")]
    Config(String),

    /// Pool or gate construction failed
    #[error(transparent)]
    Resilience(#[from] ResilienceError),
}

impl DispatchError {
    /// Whether the caller supplied bad input (as opposed to a bad state)
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DispatchError::InvalidLocation(_)
                | DispatchError::InvalidSeverity(_)
                | DispatchError::InvalidRegion(_)
                | DispatchError::InvalidContact(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DispatchError::InvalidTransition {
            id: OccurrenceId(7),
            from: OccurrenceStatus::Verified,
            to: OccurrenceStatus::Attending,
        };
        assert_eq!(
            err.to_string(),
            "occurrence 7: cannot move from verified to attending"
        );
        assert!(!err.is_input_error());
        assert!(DispatchError::InvalidSeverity(9).is_input_error());
    }
}
