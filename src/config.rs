/*!
 * Configuration for Sentinel Fire
 */

use crate::error::{Result, SentinelError};
use sentinel_core_dispatch::EngineConfig;
use sentinel_watch::WatchPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration document
///
/// ```toml
/// [engine]
/// team_count = 5
/// drone_count = 3
/// max_concurrent_missions = 1
///
/// [watch.dispatch]
/// interval_s = 5
///
/// [logging]
/// level = "info"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    /// Pools, mission behaviour and alert thresholds
    pub engine: EngineConfig,

    /// Background loops
    pub watch: WatchPolicy,

    pub logging: LoggingConfig,
}

/// Logging section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level for diagnostic output
    pub level: LogLevel,

    /// Log file path (None = stdout)
    pub file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for level = debug)
    pub verbose: bool,
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl FireConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: FireConfig = toml::from_str(&contents)
            .map_err(|e| SentinelError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SentinelError::Config(format!("Failed to render TOML: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()?;
        self.watch.validate()?;
        Ok(())
    }

    /// Configuration for a short interactive demo: fast flights, a
    /// certain confirmation and no background generator
    pub fn demo_preset() -> Self {
        let mut config = Self::default();
        config.engine.flight_delay_ms = 500;
        config.engine.p_confirm = 1.0;
        config.watch = WatchPolicy::disabled();
        config
    }
}
