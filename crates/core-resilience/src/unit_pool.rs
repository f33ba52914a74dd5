//! FIFO pool of interchangeable units
//!
//! A unit is an opaque token (a team, a drone). At any instant it is owned
//! either by the pool or by exactly one borrower. Acquisition never waits:
//! an empty pool answers immediately.

use super::error::ResilienceError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, warn};

/// Internal pool state
#[derive(Debug)]
struct PoolState<T> {
    /// Idle units, front is handed out first
    idle: VecDeque<T>,
    /// Units currently held by borrowers
    in_use: usize,
}

/// A bounded FIFO pool
///
/// Acquire and release share one lock, so `idle + in_use` is always the
/// number of units the pool was created with.
///
/// # Example
/// ```
/// use sentinel_core_resilience::UnitPool;
///
/// let pool = UnitPool::new("drone", vec!["Drone 1", "Drone 2"]);
///
/// let first = pool.try_acquire().unwrap();
/// assert_eq!(first, "Drone 1");
/// assert_eq!(pool.stats().in_use, 1);
///
/// pool.release(first);
/// assert_eq!(pool.idle_units(), vec!["Drone 2", "Drone 1"]);
/// ```
#[derive(Debug)]
pub struct UnitPool<T> {
    name: Arc<str>,
    capacity: usize,
    state: Arc<Mutex<PoolState<T>>>,
}

impl<T> Clone for UnitPool<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            capacity: self.capacity,
            state: self.state.clone(),
        }
    }
}

impl<T: Send + 'static> UnitPool<T> {
    /// Create a pool holding the given units, in order
    pub fn new(name: &str, units: impl IntoIterator<Item = T>) -> Self {
        let idle: VecDeque<T> = units.into_iter().collect();
        Self {
            name: Arc::from(name),
            capacity: idle.len(),
            state: Arc::new(Mutex::new(PoolState { idle, in_use: 0 })),
        }
    }

    /// Pool name used in logs and errors
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Take the front unit, or `None` if the pool is empty
    pub fn try_acquire(&self) -> Option<T> {
        let mut state = self.state.lock();
        let unit = state.idle.pop_front()?;
        state.in_use += 1;
        Some(unit)
    }

    /// Take the front unit, or fail with [`ResilienceError::Unavailable`]
    pub fn acquire(&self) -> Result<T, ResilienceError> {
        self.try_acquire()
            .ok_or_else(|| ResilienceError::Unavailable(self.name.to_string()))
    }

    /// Take the front unit wrapped in a lease that returns it on drop
    pub fn lease(&self) -> Option<PoolLease<T>> {
        self.try_acquire().map(|unit| PoolLease {
            unit: Some(unit),
            pool: self.clone(),
        })
    }

    /// Return a unit to the back of the pool
    ///
    /// Always succeeds.
    pub fn release(&self, unit: T) {
        let mut state = self.state.lock();
        if state.in_use == 0 {
            warn!(pool = %self.name, "release without a matching acquire");
        } else {
            state.in_use -= 1;
        }
        state.idle.push_back(unit);
        debug!(pool = %self.name, idle = state.idle.len(), "unit released");
    }

    /// Undo an acquire that could not proceed, keeping FIFO order intact
    pub fn restore(&self, unit: T) {
        let mut state = self.state.lock();
        state.in_use = state.in_use.saturating_sub(1);
        state.idle.push_front(unit);
    }

    /// Get current pool statistics
    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            idle: state.idle.len(),
            in_use: state.in_use,
            capacity: self.capacity,
        }
    }

    /// Whether no unit is idle
    pub fn is_exhausted(&self) -> bool {
        self.state.lock().idle.is_empty()
    }

    /// Idle units in hand-out order
    pub fn idle_units(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.state.lock().idle.iter().cloned().collect()
    }
}

/// A unit on loan from a pool
///
/// Dropping the lease returns the unit to the back of the pool, on every
/// exit path including panics and cancelled tasks.
#[derive(Debug)]
pub struct PoolLease<T: Send + 'static> {
    unit: Option<T>,
    pool: UnitPool<T>,
}

impl<T: Send + 'static> PoolLease<T> {
    /// The leased unit
    pub fn unit(&self) -> &T {
        // Only `into_inner` and `drop` take the unit, and both consume the lease.
        self.unit.as_ref().expect("lease holds its unit until consumed")
    }

    /// Keep the unit and detach it from the pool's automatic release
    pub fn into_inner(mut self) -> T {
        self.unit.take().expect("lease holds its unit until consumed")
    }
}

impl<T: Send + 'static> Drop for PoolLease<T> {
    fn drop(&mut self) {
        if let Some(unit) = self.unit.take() {
            self.pool.release(unit);
        }
    }
}

/// Pool statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Units waiting in the pool
    pub idle: usize,
    /// Units held by borrowers
    pub in_use: usize,
    /// Units the pool was created with
    pub capacity: usize,
}

impl PoolStats {
    /// Get pool utilization as a percentage
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            (self.in_use as f64 / self.capacity as f64) * 100.0
        }
    }

    /// Whether every unit is accounted for
    pub fn is_conserved(&self) -> bool {
        self.idle + self.in_use == self.capacity
    }
}
