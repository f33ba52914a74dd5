/*!
 * Error types for Sentinel Fire
 */

use sentinel_core_dispatch::DispatchError;
use sentinel_core_ledger::LedgerError;
use sentinel_watch::WatchError;
use std::fmt;
use std::io;

pub type Result<T> = std::result::Result<T, SentinelError>;

/// Exit code constants for structured process exit
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_FATAL: i32 = 2;
pub const EXIT_INPUT: i32 = 3;

#[derive(Debug)]
pub enum SentinelError {
    /// Configuration file or section rejected
    Config(String),

    /// I/O error
    Io(io::Error),

    /// The dispatch engine refused an operation
    Engine(DispatchError),

    /// Watcher setup failed
    Watch(WatchError),

    /// Ledger export failed
    Ledger(LedgerError),

    /// Async runtime could not be started
    Runtime(String),

    /// Generic error with message
    Other(String),
}

impl SentinelError {
    /// Get the process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SentinelError::Config(_) | SentinelError::Runtime(_) => EXIT_FATAL,
            SentinelError::Engine(e) if e.is_input_error() => EXIT_INPUT,
            SentinelError::Engine(DispatchError::Config(_)) => EXIT_FATAL,
            SentinelError::Watch(WatchError::Policy(_)) => EXIT_FATAL,
            _ => EXIT_PARTIAL,
        }
    }

    /// Check if this error is fatal (the run cannot start)
    pub fn is_fatal(&self) -> bool {
        self.exit_code() == EXIT_FATAL
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SentinelError::Config(_) => ErrorCategory::Configuration,
            SentinelError::Io(_) => ErrorCategory::IoError,
            SentinelError::Engine(DispatchError::Config(_)) => ErrorCategory::Configuration,
            SentinelError::Engine(e) if e.is_input_error() => ErrorCategory::Validation,
            SentinelError::Engine(_) => ErrorCategory::Dispatch,
            SentinelError::Watch(WatchError::Policy(_)) => ErrorCategory::Configuration,
            SentinelError::Watch(_) => ErrorCategory::Concurrency,
            SentinelError::Ledger(_) => ErrorCategory::Audit,
            SentinelError::Runtime(_) => ErrorCategory::Concurrency,
            SentinelError::Other(_) => ErrorCategory::Unknown,
        }
    }
}

/// Error category for classification and reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad operator input (location, severity, region, contact)
    Validation,
    /// I/O operation errors
    IoError,
    /// Configuration errors
    Configuration,
    /// Illegal state transitions and unknown occurrences
    Dispatch,
    /// Runtime and background task errors
    Concurrency,
    /// Ledger export errors
    Audit,
    /// Uncategorized errors
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::IoError => write!(f, "io"),
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Dispatch => write!(f, "dispatch"),
            ErrorCategory::Concurrency => write!(f, "concurrency"),
            ErrorCategory::Audit => write!(f, "audit"),
            ErrorCategory::Unknown => write!(f, "unknown"),
        }
    }
}

impl fmt::Display for SentinelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentinelError::Config(msg) => write!(f, "Configuration error: {}", msg),
            SentinelError::Io(err) => write!(f, "I/O error: {}", err),
            SentinelError::Engine(err) => write!(f, "Engine error: {}", err),
            SentinelError::Watch(err) => write!(f, "Watcher error: {}", err),
            SentinelError::Ledger(err) => write!(f, "Ledger error: {}", err),
            SentinelError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
            SentinelError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SentinelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SentinelError::Io(err) => Some(err),
            SentinelError::Engine(err) => Some(err),
            SentinelError::Watch(err) => Some(err),
            SentinelError::Ledger(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SentinelError {
    fn from(err: io::Error) -> Self {
        SentinelError::Io(err)
    }
}

impl From<DispatchError> for SentinelError {
    fn from(err: DispatchError) -> Self {
        SentinelError::Engine(err)
    }
}

impl From<WatchError> for SentinelError {
    fn from(err: WatchError) -> Self {
        match err {
            WatchError::Engine(inner) => SentinelError::Engine(inner),
            other => SentinelError::Watch(other),
        }
    }
}

impl From<LedgerError> for SentinelError {
    fn from(err: LedgerError) -> Self {
        SentinelError::Ledger(err)
    }
}

impl From<serde_json::Error> for SentinelError {
    fn from(err: serde_json::Error) -> Self {
        SentinelError::Other(format!("JSON encode error: {}", err))
    }
}
