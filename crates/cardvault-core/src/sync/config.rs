//! Pass tuning knobs

/// Default number of obsolete sets handled per reconcile batch
pub const DEFAULT_BATCH_SIZE: usize = 50;
/// Largest accepted reconcile batch
pub const MAX_BATCH_SIZE: usize = 500;
/// Default number of concurrent set fetches
pub const DEFAULT_CONCURRENCY: usize = 1;
/// Largest accepted number of concurrent set fetches
pub const MAX_CONCURRENCY: usize = 8;

/// Settings of one sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    /// Sets per reconcile batch, in `1..=500`
    pub batch_size: usize,
    /// Concurrent set fetches during Populate, in `1..=8`
    pub concurrency: usize,
    /// Ask the provider for parent-series metadata while discovering sets
    pub include_series: bool,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            include_series: true,
        }
    }
}

impl PassConfig {
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.clamp(1, MAX_BATCH_SIZE);
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    #[must_use]
    pub const fn with_include_series(mut self, include_series: bool) -> Self {
        self.include_series = include_series;
        self
    }
}
