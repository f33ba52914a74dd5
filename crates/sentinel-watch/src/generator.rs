//! Incident generator: feeds synthetic reports into the engine for demos
//! and load tests

use crate::error::WatchError;
use crate::watcher::Watcher;
use async_trait::async_trait;
use sentinel_core_dispatch::FireEngine;

pub struct IncidentGenerator {
    engine: FireEngine,
    batch: usize,
    regions: Vec<String>,
}

impl IncidentGenerator {
    pub fn new(engine: FireEngine, batch: usize, regions: Vec<String>) -> Self {
        Self {
            engine,
            batch,
            regions,
        }
    }
}

#[async_trait]
impl Watcher for IncidentGenerator {
    fn name(&self) -> &'static str {
        "generator"
    }

    async fn poll(&self) -> Result<usize, WatchError> {
        let created = self.engine.simulate(self.batch, &self.regions)?;
        Ok(created.len())
    }
}
