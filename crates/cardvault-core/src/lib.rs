//! cardvault-core - Core library for Cardvault
//!
//! This crate contains the catalog models, the `SQLite` storage layer, the
//! external catalog client and the reconciliation engine that keeps the local
//! catalog in step with the provider while preserving the user's holdings.

pub mod catalog;
pub mod db;
pub mod error;
pub mod filter;
pub mod mapper;
pub mod models;
pub mod progress;
pub mod sync;
pub mod util;

pub use catalog::{CatalogClient, CatalogClientConfig, CatalogError, HttpCatalogClient};
pub use db::{CatalogStore, Database};
pub use error::{Error, Result};
pub use filter::{filter_cards, FilterCriteria};
pub use models::{Card, CardListing, CardSet, Holding, HoldingId, SyncRun, SyncRunStatus};
pub use progress::{ChannelReporter, ProgressReporter, SilentReporter, SyncEvent};
pub use sync::{PassConfig, SyncEngine, SyncReport};
