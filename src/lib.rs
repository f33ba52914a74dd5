/*!
 * Sentinel Fire - occurrence dispatch and verification
 *
 * Operator-facing layer over the workspace crates:
 * - TOML configuration for the engine, the watchers and logging
 * - tracing subscriber setup
 * - process exit codes
 * - human and JSON output for the CLI
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod output;

// Re-export commonly used types
pub use config::{FireConfig, LogLevel, LoggingConfig};
pub use error::{Result, SentinelError};
pub use sentinel_core_dispatch::{EngineConfig, FireEngine};
pub use sentinel_watch::{WatchPolicy, WatchSupervisor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
