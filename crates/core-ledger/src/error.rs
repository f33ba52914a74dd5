//! Error types for ledger export and import

use std::io;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while exporting or parsing a ledger
///
/// Appending to a ledger never fails; only the JSON Lines round trip can.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// I/O error while writing or reading an export
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of an export could not be parsed back into a record
    #[error("Invalid ledger entry at line {line}: {reason}")]
    InvalidEntry { line: usize, reason: String },

    /// Unknown record kind
    #[error("Invalid record kind: {0}")]
    InvalidKind(String),
}

impl LedgerError {
    /// Create an invalid entry error
    pub fn invalid_entry(line: usize, reason: &str) -> Self {
        LedgerError::InvalidEntry {
            line,
            reason: reason.to_string(),
        }
    }

    /// Create an invalid kind error
    pub fn invalid_kind<S: Into<String>>(kind: S) -> Self {
        LedgerError::InvalidKind(kind.into())
    }
}
