//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{SyncError, SyncResult};

/// Tuning knobs for one connector's sync engine.
///
/// Backpressure is expressed here rather than as scattered sleeps: the
/// inter-page pause and the scope concurrency bound are explicit values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Whether sync is enabled for this connector.
    pub enabled: bool,
    /// Maximum records per dispatch batch, and the page-size hint passed to
    /// the Change Source.
    pub batch_size: usize,
    /// Maximum number of scopes processed concurrently.
    pub max_concurrent_scopes: usize,
    /// Outbound request budget against the external API, per second.
    pub rate_limit_per_second: u32,
    /// Pause between pages so one large scope does not starve the rest.
    pub page_pause_ms: u64,
    /// Whether container items spawn their own child scopes.
    pub recurse_into_containers: bool,
}

impl SyncConfig {
    /// Inter-page pause as a Duration.
    #[must_use]
    pub fn page_pause(&self) -> Duration {
        Duration::from_millis(self.page_pause_ms)
    }

    /// Check if this configuration is valid.
    pub fn validate(&self) -> SyncResult<()> {
        if self.batch_size < 1 || self.batch_size > 10_000 {
            return Err(SyncError::configuration(
                "Batch size must be between 1 and 10000",
            ));
        }
        if self.max_concurrent_scopes < 1 || self.max_concurrent_scopes > 64 {
            return Err(SyncError::configuration(
                "Concurrent scope bound must be between 1 and 64",
            ));
        }
        if self.rate_limit_per_second < 1 {
            return Err(SyncError::configuration(
                "Rate limit must be at least 1 request per second",
            ));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: 100,
            max_concurrent_scopes: 4,
            rate_limit_per_second: 10,
            page_pause_ms: 50,
            recurse_into_containers: false,
        }
    }
}
