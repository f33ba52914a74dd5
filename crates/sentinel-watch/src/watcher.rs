//! The watcher loop
//!
//! ```text
//!   ┌──> cancelled? ──yes──> exit
//!   │        │ no
//!   │        ▼
//!   │      poll()  ── Ok(n) ──> record, pause = interval
//!   │        │
//!   │        ├──── Err ──────> warn, record, pause = backoff
//!   │        └──── panic ────> error, record, pause = backoff
//!   │        ▼
//!   └── sleep(pause) or cancelled
//! ```
//!
//! A failed or panicking poll never ends the loop; only cancellation does.

use crate::error::WatchError;
use crate::metrics::{StatsRecorder, WatchStats};
use crate::policy::LoopPolicy;
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One background coordinator
#[async_trait]
pub trait Watcher: Send + Sync + 'static {
    /// Name used in logs and stats
    fn name(&self) -> &'static str;

    /// Run one iteration; returns how many items were acted on
    async fn poll(&self) -> Result<usize, WatchError>;
}

/// Drive `watcher` until `cancel` fires, returning its final totals
pub async fn run_loop(
    watcher: Arc<dyn Watcher>,
    timing: LoopPolicy,
    cancel: CancellationToken,
    stats: StatsRecorder,
) -> WatchStats {
    let name = watcher.name();
    info!(
        watcher = name,
        interval_s = timing.interval_s,
        backoff_s = timing.backoff_s,
        "👁️  watcher started"
    );

    loop {
        if cancel.is_cancelled() {
            break;
        }

        let pause = match AssertUnwindSafe(watcher.poll()).catch_unwind().await {
            Ok(Ok(actions)) => {
                if actions > 0 {
                    debug!(watcher = name, actions, "poll acted");
                }
                stats.record_poll(actions);
                timing.interval()
            }
            Ok(Err(e)) => {
                warn!(watcher = name, error = %e, backoff_s = timing.backoff_s, "poll failed; backing off");
                stats.record_failure(e.to_string());
                timing.backoff()
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                let e = WatchError::Panicked {
                    name: name.to_string(),
                    message,
                };
                error!(watcher = name, error = %e, backoff_s = timing.backoff_s, "poll panicked; backing off");
                stats.record_panic(e.to_string());
                timing.backoff()
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }

    let totals = stats.snapshot();
    info!(watcher = name, "🛑 watcher stopped | {}", totals.summary());
    totals
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
