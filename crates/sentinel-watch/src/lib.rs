//! Sentinel Watch: background coordinators for the dispatch engine
//!
//! Four loops keep the engine moving without external input:
//!
//! - **Dispatch**: sends a drone to the most severe eligible occurrence
//! - **Extinguish**: resolves active fires with a fixed probability
//! - **Generator**: synthesizes reports for demos and load tests
//! - **Attendance** (off by default): concludes open attendances
//!
//! # Architecture
//!
//! ```text
//!            root CancellationToken
//!                    │ child_token
//!                    ▼
//!            ┌───────────────┐
//!            │WatchSupervisor│
//!            └───┬───┬───┬───┘
//!       ┌────────┘   │   └────────┐
//!       ▼            ▼            ▼
//!   run_loop     run_loop     run_loop ...
//!   (dispatch)   (extinguish) (generator)
//!       │            │            │
//!       └────────────┴────────────┘
//!                    ▼
//!               FireEngine
//! ```
//!
//! # Example
//!
//! ```no_run
//! use sentinel_core_dispatch::{EngineConfig, FireEngine};
//! use sentinel_watch::{WatchPolicy, WatchSupervisor};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = FireEngine::new(EngineConfig::default())?;
//! let root = CancellationToken::new();
//! let supervisor = WatchSupervisor::start(&engine, &WatchPolicy::default(), &root)?;
//!
//! tokio::signal::ctrl_c().await?;
//! for (name, stats) in supervisor.shutdown().await {
//!     println!("{name}: {}", stats.summary());
//! }
//! # Ok(())
//! # }
//! ```

pub mod attendance;
pub mod dispatch;
pub mod error;
pub mod extinguish;
pub mod generator;
pub mod metrics;
pub mod policy;
pub mod supervisor;
pub mod watcher;

pub use attendance::AttendanceWatcher;
pub use dispatch::DispatchWatcher;
pub use error::{Result, WatchError};
pub use extinguish::ExtinguishWatcher;
pub use generator::IncidentGenerator;
pub use metrics::{StatsRecorder, WatchStats};
pub use policy::{LoopPolicy, WatchPolicy};
pub use supervisor::WatchSupervisor;
pub use watcher::{run_loop, Watcher};
