//! Catalog synchronization.
//!
//! A pass runs four strictly ordered phases:
//!
//! 1. **Discover**: list every set from the provider and upsert them. Failure
//!    here aborts the pass; there is nothing to reconcile against.
//! 2. **Populate**: fetch each set's members and write them as one unit per
//!    set. A failing set becomes a warning and the loop moves on.
//! 3. **Reconcile**: rows whose `synced_at` predates the pass epoch are
//!    obsolete. In bounded batches, holdings on obsolete cards are repointed
//!    at a surviving card with the same name, print number and set name;
//!    whatever cannot be repointed is deleted in foreign-key order.
//! 4. **Report**: emit final counts and record the pass in `sync_runs`.
//!
//! Callers must serialize passes against one database; the engine itself does
//! not lock.

mod config;
mod engine;
mod report;


pub use config::{
    PassConfig, DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, MAX_BATCH_SIZE, MAX_CONCURRENCY,
};
pub use engine::SyncEngine;
pub use report::SyncReport;
