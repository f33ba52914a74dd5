//! Extinguish watcher: probabilistically resolves active fires

use crate::error::WatchError;
use crate::watcher::Watcher;
use async_trait::async_trait;
use sentinel_core_dispatch::FireEngine;

pub struct ExtinguishWatcher {
    engine: FireEngine,
    probability: f64,
}

impl ExtinguishWatcher {
    pub fn new(engine: FireEngine, probability: f64) -> Self {
        Self {
            engine,
            probability,
        }
    }
}

#[async_trait]
impl Watcher for ExtinguishWatcher {
    fn name(&self) -> &'static str {
        "extinguish"
    }

    async fn poll(&self) -> Result<usize, WatchError> {
        Ok(self.engine.extinguish_sweep(self.probability).len())
    }
}
