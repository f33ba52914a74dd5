//! Watcher metrics
//!
//! Each loop keeps running totals that the supervisor can read at any time
//! and returns on shutdown.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Running totals for one watcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchStats {
    /// Polls that completed without error
    pub polls: u64,

    /// Items acted on across all polls (dispatches, fires resolved, ...)
    pub actions: u64,

    /// Polls that returned an error
    pub failures: u64,

    /// Polls that panicked
    pub panics: u64,

    /// Most recent failure message
    pub last_error: Option<String>,

    /// When the last poll finished
    pub last_poll: Option<DateTime<Utc>>,
}

impl WatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of polls attempted
    pub fn attempts(&self) -> u64 {
        self.polls + self.failures + self.panics
    }

    /// Fraction of polls that succeeded (0.0 - 1.0)
    pub fn success_ratio(&self) -> f64 {
        let attempts = self.attempts();
        if attempts == 0 {
            1.0
        } else {
            self.polls as f64 / attempts as f64
        }
    }

    /// Format a human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "{} polls | {} actions | {} failures | {} panics ({:.1}% ok)",
            self.attempts(),
            self.actions,
            self.failures,
            self.panics,
            self.success_ratio() * 100.0
        )
    }
}

/// Shared recorder a loop writes into
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    inner: Arc<Mutex<WatchStats>>,
}

impl StatsRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_poll(&self, actions: usize) {
        let mut stats = self.inner.lock();
        stats.polls += 1;
        stats.actions += actions as u64;
        stats.last_poll = Some(Utc::now());
    }

    pub fn record_failure(&self, message: impl Into<String>) {
        let mut stats = self.inner.lock();
        stats.failures += 1;
        stats.last_error = Some(message.into());
        stats.last_poll = Some(Utc::now());
    }

    pub fn record_panic(&self, message: impl Into<String>) {
        let mut stats = self.inner.lock();
        stats.panics += 1;
        stats.last_error = Some(message.into());
        stats.last_poll = Some(Utc::now());
    }

    /// Copy of the current totals
    pub fn snapshot(&self) -> WatchStats {
        self.inner.lock().clone()
    }
}
