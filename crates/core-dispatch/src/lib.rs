//! Sentinel Core Dispatch: occurrence dispatch and verification engine
//!
//! # Overview
//!
//! - **Incident store + priority queue**: every fire report, ordered by
//!   `-severity × region weight` and re-keyed whenever severity changes
//! - **Drone missions**: non-blocking dispatch, asynchronous verification,
//!   guaranteed return of the drone and the mission gate slot
//! - **Attendance**: teams assigned from a FIFO pool, released on conclusion
//! - **Alerts**: fire-and-forget delivery through an [`AlertGateway`]
//!
//! # Architecture
//!
//! ```text
//!  report / simulate          attend_next / conclude
//!        │                            │
//!        ▼                            ▼
//! ┌──────────────────────────────────────────────┐
//! │ FireEngine (one state mutex)                 │
//! │  IncidentStore ── PriorityQueue              │
//! │  RegionRegistry   TaskStack                  │
//! └───────┬───────────────────────────┬──────────┘
//!         │ dispatch_drone            │ ledgers
//!         ▼                           ▼
//!  UnitPool<DroneId> + MissionGate   HistoryLedger / drone log
//!         │
//!         ▼ spawned mission (MissionLease)
//!  VerificationProbe ──> FireActive | Verified | restored on failure
//!         │
//!         ▼
//!  AlertDispatcher ──> AlertGateway (spawned sends)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sentinel_core_dispatch::{EngineConfig, FireEngine, Location, Severity};
//!
//! # async fn demo() -> sentinel_core_dispatch::Result<()> {
//! let engine = FireEngine::new(EngineConfig::default())?;
//! let occurrence = engine.report(
//!     Location::coordinates(-3.1, -60.0)?,
//!     Severity::new(5)?,
//!     "Amazônia",
//! )?;
//! assert_eq!(occurrence.priority_key, -10);
//!
//! let outcome = engine.dispatch_drone(occurrence.id);
//! assert!(outcome.is_accepted());
//! engine.settle().await;
//! # Ok(())
//! # }
//! ```

pub mod alert;
pub mod config;
pub mod contacts;
pub mod engine;
pub mod error;
pub mod mission;
pub mod occurrence;
pub mod probe;
pub mod queue;
pub mod region;
pub mod report;
pub mod store;
pub mod tasks;
pub mod units;

pub use alert::{Alert, AlertDispatcher, AlertGateway, Channel, DeliveryError, TemplateKind, TracingGateway};
pub use config::EngineConfig;
pub use contacts::{default_contacts, Contact, ContactDirectory, ContactKind};
pub use engine::{AttendOutcome, Attendance, Conclusion, EngineBuilder, FireEngine};
pub use error::{DispatchError, Result};
pub use mission::{DispatchOutcome, DispatchRejection, MissionOutcome};
pub use occurrence::{Location, OccurrenceId, OccurrenceSnapshot, OccurrenceStatus, Severity};
pub use probe::{ProbeError, SimulatedProbe, VerificationProbe};
pub use report::{MapMarker, MarkerColor, RegionSummary};
pub use units::{DroneId, ResourceKind, TeamId};
