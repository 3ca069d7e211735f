//! External catalog provider boundary.
//!
//! [`CatalogClient`] is the contract the reconciliation engine needs from the
//! provider. It is pure I/O: no retries, no business rules. Transport and
//! payload failures surface as [`CatalogError`]; a set that legitimately has
//! no members is `Ok` with an empty card list.

mod http;
mod types;

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

pub use http::{parse_set_detail, parse_set_list, CatalogClientConfig, HttpCatalogClient};
pub use types::{
    CardCount, ExternalAbility, ExternalAttack, ExternalCard, ExternalCardmarketPricing,
    ExternalPricing, ExternalSeries, ExternalSetDetail, ExternalSetSummary,
    ExternalTcgplayerFinish, ExternalTcgplayerPricing, ExternalTypeModifier, ExternalVariants,
    SeriesRef, MAX_RETREAT,
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid catalog configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Catalog HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Catalog API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid catalog payload: {0}")]
    Decode(String),
    #[error("Invalid catalog record: {0}")]
    InvalidRecord(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Read access to the external card catalog.
pub trait CatalogClient: Send + Sync {
    /// List every set the provider knows about. With `include_series` the
    /// summaries carry their parent series.
    fn list_sets(
        &self,
        include_series: bool,
    ) -> impl Future<Output = CatalogResult<Vec<ExternalSetSummary>>> + Send;

    /// Fetch one set's detail together with all of its member cards.
    fn get_set(&self, set_id: &str) -> impl Future<Output = CatalogResult<ExternalSetDetail>> + Send;
}

impl<T: CatalogClient> CatalogClient for Arc<T> {
    fn list_sets(
        &self,
        include_series: bool,
    ) -> impl Future<Output = CatalogResult<Vec<ExternalSetSummary>>> + Send {
        (**self).list_sets(include_series)
    }

    fn get_set(&self, set_id: &str) -> impl Future<Output = CatalogResult<ExternalSetDetail>> + Send {
        (**self).get_set(set_id)
    }
}
