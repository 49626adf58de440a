pub mod service;

pub use service::SyncService;

use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Observer for long-running sync loops, called with
/// `(completed_count, total_count)` after each processed item.
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Configuration for the synchronizer.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between consecutive requests to the tracker API. Requests
    /// are always issued sequentially; this is the only suspension point.
    pub throttle_delay: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            throttle_delay: Duration::from_millis(100),
        }
    }
}

/// Per-call options for the throttled round backfill loops.
#[derive(Default)]
pub struct BackfillOptions {
    /// Overrides the configured throttle delay for this call.
    pub throttle_delay: Option<Duration>,
    /// Progress observer, enabling cancellable UI-driven syncs.
    pub progress: Option<ProgressFn>,
    /// Cooperative cancellation, checked between iterations.
    pub cancel: Option<CancellationToken>,
}

/// Result of a round backfill run.
#[derive(Debug, Clone, Default)]
pub struct RoundSyncReport {
    /// Game identifiers whose rounds were actually synced.
    pub game_ids: Vec<String>,
    /// Total number of rounds fetched across all synced games.
    pub total_rounds: usize,
}
