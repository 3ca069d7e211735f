//! Catalog set model

use serde::{Deserialize, Serialize};

/// A set (expansion) in the local catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSet {
    /// Provider identifier (not stable across provider changes)
    pub id: String,
    /// Display name
    pub name: String,
    /// Parent series display name, when the provider reported one
    pub series: Option<String>,
    /// Nominal number of cards in the set
    pub card_count: i64,
    /// Release date as reported (`YYYY-MM-DD`)
    pub release_date: Option<String>,
    pub logo_url: Option<String>,
    pub symbol_url: Option<String>,
    /// Last pass that wrote this row (Unix ms)
    pub synced_at: i64,
}
