//! Mission gate: caps how many missions may be in flight at once
//!
//! A capacity of 1 serializes the whole fleet (one mission at a time, no
//! matter how many drones are idle). Larger capacities allow that many
//! concurrent missions.

use super::error::ResilienceError;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Counting gate backed by a semaphore
///
/// Entering never waits; a full gate answers `None` immediately.
///
/// # Example
/// ```
/// use sentinel_core_resilience::MissionGate;
///
/// let gate = MissionGate::new(1).unwrap();
/// let permit = gate.try_enter().unwrap();
/// assert!(gate.is_full());
/// assert!(gate.try_enter().is_none());
///
/// drop(permit);
/// assert_eq!(gate.in_flight(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MissionGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl MissionGate {
    /// Create a gate admitting up to `capacity` concurrent holders
    pub fn new(capacity: usize) -> Result<Self, ResilienceError> {
        if capacity == 0 {
            return Err(ResilienceError::InvalidCapacity {
                name: "mission gate".to_string(),
                capacity,
            });
        }

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        })
    }

    /// Try to take a slot without waiting
    pub fn try_enter(&self) -> Option<GatePermit> {
        self.semaphore
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| GatePermit { _permit: permit })
    }

    /// Number of holders right now
    pub fn in_flight(&self) -> usize {
        self.capacity - self.semaphore.available_permits()
    }

    /// Whether every slot is taken
    pub fn is_full(&self) -> bool {
        self.semaphore.available_permits() == 0
    }

    /// Maximum number of concurrent holders
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A held gate slot; dropping it frees the slot
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}
