//! Dispatch watcher: sends a drone to the most severe eligible occurrence

use crate::error::WatchError;
use crate::watcher::Watcher;
use async_trait::async_trait;
use sentinel_core_dispatch::{DispatchOutcome, FireEngine, Severity};
use tracing::{debug, info};

pub struct DispatchWatcher {
    engine: FireEngine,
    threshold: Severity,
}

impl DispatchWatcher {
    /// Watch for `Pending` or `FireActive` occurrences above `threshold`
    pub fn new(engine: FireEngine, threshold: Severity) -> Self {
        Self { engine, threshold }
    }
}

#[async_trait]
impl Watcher for DispatchWatcher {
    fn name(&self) -> &'static str {
        "dispatch"
    }

    async fn poll(&self) -> Result<usize, WatchError> {
        match self.engine.dispatch_highest(self.threshold) {
            None => Ok(0),
            Some((id, DispatchOutcome::Accepted { drone })) => {
                info!(occurrence = %id, %drone, "auto-dispatched drone");
                Ok(1)
            }
            // a busy fleet is the normal case; try again next poll
            Some((id, DispatchOutcome::Rejected(reason))) => {
                debug!(occurrence = %id, %reason, "auto-dispatch deferred");
                Ok(0)
            }
        }
    }
}
