// ── Bulk health refresh ──
//
// Re-probes every loaded resource concurrently. Only one bulk refresh
// runs at a time; a call made while one is running returns immediately
// without touching the network. A cancelled refresh stops writing.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::Resource;
use crate::probe::HealthProber;
use crate::store::StatusStore;

/// Result of a [`BulkRefresher::refresh_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Every resource was probed; `recorded` of them produced a record.
    Completed { probed: usize, recorded: usize },
    /// Another bulk refresh was in flight; nothing was done.
    AlreadyRunning,
    /// The token was cancelled first; in-flight probes were dropped.
    Cancelled,
}

#[derive(Debug, Default)]
pub struct BulkRefresher {
    running: AtomicBool,
}

/// Clears the running flag when the refresh finishes or is dropped.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BulkRefresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub async fn refresh_all(
        &self,
        resources: &[Arc<Resource>],
        prober: &HealthProber,
        store: &StatusStore,
        cancel: &CancellationToken,
    ) -> RefreshOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("bulk refresh already running");
            return RefreshOutcome::AlreadyRunning;
        }
        let _guard = RunningGuard(&self.running);

        if cancel.is_cancelled() {
            return RefreshOutcome::Cancelled;
        }
        let probes = join_all(resources.iter().map(|r| prober.probe_into(r, store)));
        let results = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!("bulk refresh cancelled");
                return RefreshOutcome::Cancelled;
            }
            results = probes => results,
        };
        let recorded = results.iter().filter(|r| r.is_some()).count();
        debug!(probed = resources.len(), recorded, "bulk refresh complete");
        RefreshOutcome::Completed {
            probed: resources.len(),
            recorded,
        }
    }
}
