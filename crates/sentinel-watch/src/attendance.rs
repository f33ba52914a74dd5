//! Attendance watcher: closes every attendance still open at each poll

use crate::error::WatchError;
use crate::watcher::Watcher;
use async_trait::async_trait;
use sentinel_core_dispatch::FireEngine;

pub struct AttendanceWatcher {
    engine: FireEngine,
}

impl AttendanceWatcher {
    pub fn new(engine: FireEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Watcher for AttendanceWatcher {
    fn name(&self) -> &'static str {
        "attendance"
    }

    async fn poll(&self) -> Result<usize, WatchError> {
        Ok(self.engine.conclude_attending().len())
    }
}
