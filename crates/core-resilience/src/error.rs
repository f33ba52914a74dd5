//! Error types for resource primitives

use thiserror::Error;

/// Errors raised by pools and gates
///
/// An empty pool is not an error for `try_acquire`; callers that prefer a
/// `Result` use `acquire`, which maps emptiness to [`ResilienceError::Unavailable`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResilienceError {
    /// No idle unit in the named pool
    #[error("no {0} available")]
    Unavailable(String),

    /// A gate or pool was configured with an impossible capacity
    #[error("invalid capacity for {name}: {capacity}")]
    InvalidCapacity { name: String, capacity: usize },
}
