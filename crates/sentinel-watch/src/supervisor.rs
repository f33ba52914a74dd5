//! Supervisor: starts the enabled watchers under one cancellation root

use crate::attendance::AttendanceWatcher;
use crate::dispatch::DispatchWatcher;
use crate::error::{Result, WatchError};
use crate::extinguish::ExtinguishWatcher;
use crate::generator::IncidentGenerator;
use crate::metrics::{StatsRecorder, WatchStats};
use crate::policy::{LoopPolicy, WatchPolicy};
use crate::watcher::{run_loop, Watcher};
use sentinel_core_dispatch::{FireEngine, Severity};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

struct Running {
    name: &'static str,
    stats: StatsRecorder,
    handle: JoinHandle<WatchStats>,
}

/// Owns the watcher tasks
///
/// Dropping the supervisor without calling [`shutdown`](Self::shutdown)
/// cancels the loops but does not wait for them.
pub struct WatchSupervisor {
    cancel: CancellationToken,
    running: Vec<Running>,
}

impl WatchSupervisor {
    /// Empty supervisor whose loops stop when `parent` is cancelled
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            cancel: parent.child_token(),
            running: Vec::new(),
        }
    }

    /// Validate `policy` and spawn every enabled loop against `engine`
    pub fn start(engine: &FireEngine, policy: &WatchPolicy, parent: &CancellationToken) -> Result<Self> {
        policy.validate()?;
        let threshold = Severity::new(policy.dispatch_severity_threshold)?;

        let mut supervisor = Self::new(parent);
        if policy.dispatch.enabled {
            supervisor.spawn(
                Arc::new(DispatchWatcher::new(engine.clone(), threshold)),
                policy.dispatch.clone(),
            );
        }
        if policy.extinguish.enabled {
            supervisor.spawn(
                Arc::new(ExtinguishWatcher::new(
                    engine.clone(),
                    policy.extinguish_probability,
                )),
                policy.extinguish.clone(),
            );
        }
        if policy.generator.enabled {
            supervisor.spawn(
                Arc::new(IncidentGenerator::new(
                    engine.clone(),
                    policy.generator_batch,
                    policy.generator_regions.clone(),
                )),
                policy.generator.clone(),
            );
        }
        if policy.attendance.enabled {
            supervisor.spawn(
                Arc::new(AttendanceWatcher::new(engine.clone())),
                policy.attendance.clone(),
            );
        }

        info!(watchers = ?supervisor.names(), "🛡️  watchers active");
        Ok(supervisor)
    }

    /// Spawn an additional loop
    pub fn spawn(&mut self, watcher: Arc<dyn Watcher>, timing: LoopPolicy) {
        let name = watcher.name();
        let stats = StatsRecorder::new();
        let handle = tokio::spawn(run_loop(watcher, timing, self.cancel.clone(), stats.clone()));
        self.running.push(Running {
            name,
            stats,
            handle,
        });
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.running.iter().map(|r| r.name).collect()
    }

    /// Token the loops observe
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Current totals per loop
    pub fn stats(&self) -> Vec<(&'static str, WatchStats)> {
        self.running
            .iter()
            .map(|r| (r.name, r.stats.snapshot()))
            .collect()
    }

    /// Cancel every loop and wait for it to exit
    ///
    /// A loop whose task cannot be joined is reported with the totals it
    /// had recorded so far.
    pub async fn shutdown(mut self) -> Vec<(&'static str, WatchStats)> {
        self.cancel.cancel();
        let mut totals = Vec::with_capacity(self.running.len());
        for running in self.running.drain(..) {
            match running.handle.await {
                Ok(stats) => totals.push((running.name, stats)),
                Err(e) => {
                    let e = WatchError::Join {
                        name: running.name.to_string(),
                        message: e.to_string(),
                    };
                    warn!(error = %e, "watcher join failed");
                    totals.push((running.name, running.stats.snapshot()));
                }
            }
        }
        info!(watchers = totals.len(), "all watchers stopped");
        totals
    }
}

impl Drop for WatchSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
