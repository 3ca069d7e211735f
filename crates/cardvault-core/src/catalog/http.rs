//! HTTP implementation of the catalog contract against a TCGdex-style REST API.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;

use super::{
    CatalogClient, CatalogError, CatalogResult, ExternalSeries, ExternalSetDetail,
    ExternalSetSummary, SeriesRef,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

const DEFAULT_BASE_URL: &str = "https://api.tcgdex.net/v2";
const DEFAULT_LANGUAGE: &str = "en";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`HttpCatalogClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogClientConfig {
    /// API root without language segment (e.g. `https://api.tcgdex.net/v2`)
    pub base_url: String,
    /// Catalog language segment (`en`, `fr`, ...)
    pub language: String,
    /// Per-request timeout, surfaced as an ordinary request failure
    pub timeout: Duration,
}

impl Default for CatalogClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CatalogClientConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Root URL including the language segment
    fn root_url(&self) -> CatalogResult<String> {
        let base = normalize_text_option(Some(self.base_url.clone())).ok_or_else(|| {
            CatalogError::InvalidConfiguration("base URL must not be empty".to_string())
        })?;
        if !is_http_url(&base) {
            return Err(CatalogError::InvalidConfiguration(
                "base URL must include http:// or https://".to_string(),
            ));
        }
        let language = normalize_text_option(Some(self.language.clone())).ok_or_else(|| {
            CatalogError::InvalidConfiguration("language must not be empty".to_string())
        })?;
        Ok(format!("{}/{language}", base.trim_end_matches('/')))
    }
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    root_url: String,
    client: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(config: &CatalogClientConfig) -> CatalogResult<Self> {
        let root_url = config.root_url()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cardvault/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { root_url, client })
    }

    async fn get_text(&self, path: &str) -> CatalogResult<String> {
        let url = format!("{}/{path}", self.root_url);
        tracing::debug!(url = url.as_str(), "Fetching catalog resource");

        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message: parse_api_error(status, &body),
            });
        }

        Ok(response.text().await?)
    }

    async fn list_series(&self) -> CatalogResult<Vec<ExternalSeries>> {
        let body = self.get_text("series").await?;
        decode(&body, "series list")
    }

    async fn get_series(&self, series_id: &str) -> CatalogResult<ExternalSeries> {
        let body = self
            .get_text(&format!("series/{}", urlencoding::encode(series_id)))
            .await?;
        decode(&body, "series detail")
    }

    /// Map every set id to its parent series
    async fn series_index(&self) -> CatalogResult<HashMap<String, SeriesRef>> {
        let mut index = HashMap::new();
        for series in self.list_series().await? {
            let detail = self.get_series(&series.id).await?;
            for set in detail.sets {
                index.insert(
                    set.id,
                    SeriesRef {
                        id: detail.id.clone(),
                        name: detail.name.clone(),
                    },
                );
            }
        }
        Ok(index)
    }
}

impl CatalogClient for HttpCatalogClient {
    async fn list_sets(&self, include_series: bool) -> CatalogResult<Vec<ExternalSetSummary>> {
        let body = self.get_text("sets").await?;
        let mut sets = parse_set_list(&body)?;

        if include_series {
            let index = self.series_index().await?;
            for set in &mut sets {
                if set.serie.is_none() {
                    set.serie = index.get(&set.id).cloned();
                }
            }
        }

        Ok(sets)
    }

    async fn get_set(&self, set_id: &str) -> CatalogResult<ExternalSetDetail> {
        let body = self
            .get_text(&format!("sets/{}", urlencoding::encode(set_id)))
            .await?;
        parse_set_detail(&body)
    }
}

/// Parse the "list all sets" payload.
pub fn parse_set_list(payload: &str) -> CatalogResult<Vec<ExternalSetSummary>> {
    decode(payload, "set list")
}

/// Parse a set detail payload including its raw member cards.
pub fn parse_set_detail(payload: &str) -> CatalogResult<ExternalSetDetail> {
    decode(payload, "set detail")
}

fn decode<T: for<'de> Deserialize<'de>>(payload: &str, what: &str) -> CatalogResult<T> {
    serde_json::from_str(payload).map_err(|error| CatalogError::Decode(format!("{what}: {error}")))
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
    title: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error).or(payload.title) {
            return compact_text(&message);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}
