//! Final statistics of a sync pass

use serde::{Deserialize, Serialize};

/// Counts reported when a pass finishes.
///
/// Processed counts only cover units that were written successfully; skipped
/// units are counted separately so the caller can decide whether to re-run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Sets whose members were fetched and written
    pub sets_processed: usize,
    /// Cards written
    pub cards_processed: usize,
    pub sets_removed: usize,
    pub cards_removed: usize,
    pub holdings_migrated: usize,
    /// Holdings deleted because no successor card was found
    pub holdings_removed: usize,
    /// Sets whose fetch or write failed
    pub sets_failed: usize,
    /// Malformed member records that were skipped
    pub cards_skipped: usize,
    /// Reconcile batches that failed and were rolled back
    pub batches_failed: usize,
    /// Warning events emitted
    pub warnings: usize,
}

impl SyncReport {
    /// Units the pass could not process
    pub const fn skipped_units(&self) -> usize {
        self.sets_failed + self.cards_skipped + self.batches_failed
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Synced {} sets and {} cards; removed {} sets; migrated {} holdings",
            self.sets_processed, self.cards_processed, self.sets_removed, self.holdings_migrated
        );
        let skipped = self.skipped_units();
        if skipped > 0 {
            summary.push_str(&format!("; skipped {skipped} units"));
        }
        summary
    }
}
