//! Database layer for Cardvault

mod catalog_repository;
mod connection;
mod holding_repository;
mod migrations;
mod store;
mod sync_run_repository;

pub use catalog_repository::{SqliteCatalogRepository, StaleCard};
pub use connection::Database;
pub use holding_repository::{HoldingRepository, SqliteHoldingRepository};
pub use store::{CatalogStore, PassStart, ReconcileOutcome, ReconcilePlan};
pub use sync_run_repository::SqliteSyncRunRepository;

/// Upper bound on bound parameters in one `IN (...)` list
pub(crate) const MAX_IN_PARAMS: usize = 500;

/// `?, ?, ?` placeholder list for an `IN (...)` clause of `len` values
pub(crate) fn placeholders(len: usize) -> String {
    vec!["?"; len].join(", ")
}
