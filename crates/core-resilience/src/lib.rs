//! Sentinel Core Resilience: pure-logic resource primitives
//!
//! # Overview
//!
//! - **Unit Pool**: FIFO pool of interchangeable units (teams, drones) with
//!   non-blocking acquisition and drop-guarded leases
//! - **Mission Gate**: counting gate limiting how many missions run at once
//!
//! # Key Principles
//!
//! This crate has no knowledge of occurrences, regions or alerts. It only
//! guarantees that units are never lost or duplicated and that gate slots
//! are always returned.
//!
//! # Architecture
//!
//! ```text
//! dispatch request
//!       │
//!       ▼
//! ┌──────────────────────┐   empty?  ──> Rejected(ResourceUnavailable)
//! │  UnitPool::lease()   │
//! └──────────┬───────────┘
//!            ▼
//! ┌──────────────────────┐   full?   ──> restore unit, Rejected(MissionInFlight)
//! │MissionGate::try_enter│
//! └──────────┬───────────┘
//!            ▼
//!      mission runs; dropping the lease + permit releases both
//! ```

pub mod error;
pub mod mission_gate;
pub mod unit_pool;

pub use error::ResilienceError;
pub use mission_gate::{GatePermit, MissionGate};
pub use unit_pool::{PoolLease, PoolStats, UnitPool};
