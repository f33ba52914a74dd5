//! Watcher error types

use sentinel_core_dispatch::DispatchError;
use thiserror::Error;

/// Result type alias for watcher operations
pub type Result<T> = std::result::Result<T, WatchError>;

/// Failures inside a watcher iteration or in supervisor setup
///
/// An iteration failure never stops its loop: the loop logs it, backs off
/// and polls again.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The engine refused an operation
    #[error(transparent)]
    Engine(#[from] DispatchError),

    /// A poll panicked
    #[error("watcher {name} panicked: {message}")]
    Panicked { name: String, message: String },

    /// Policy failed validation
    #[error("invalid watch policy: {0}")]
    Policy(String),

    /// A watcher task could not be joined on shutdown
    #[error("watcher task {name} did not shut down cleanly: {message}")]
    Join { name: String, message: String },
}
