use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use cardvault_core::sync::{MAX_BATCH_SIZE, MAX_CONCURRENCY};
use cardvault_core::{CatalogClientConfig, PassConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub catalog: CatalogClientConfig,
    pub pass: PassConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "CARDVAULT_API_BIND_ADDR", "127.0.0.1:8080");
        let db_path = PathBuf::from(value_or_default(
            &lookup,
            "CARDVAULT_DB_PATH",
            "cardvault.db",
        ));

        let catalog_url =
            value_or_default(&lookup, "CATALOG_API_URL", "https://api.tcgdex.net/v2");
        if !is_http_url(&catalog_url) {
            return Err(ConfigError::Invalid(
                "CATALOG_API_URL must start with http:// or https://".to_string(),
            ));
        }
        let catalog_language = value_or_default(&lookup, "CATALOG_LANGUAGE", "en");

        let timeout_secs = bounded(&lookup, "CATALOG_HTTP_TIMEOUT_SECS", 30, 1..=300)?;
        let batch_size = bounded(&lookup, "SYNC_BATCH_SIZE", 50, 1..=MAX_BATCH_SIZE as u64)?;
        let concurrency = bounded(&lookup, "SYNC_CONCURRENCY", 1, 1..=MAX_CONCURRENCY as u64)?;

        let include_series = match optional_trimmed(&lookup, "SYNC_INCLUDE_SERIES") {
            None => true,
            Some(value) => parse_bool(&value).ok_or_else(|| {
                ConfigError::Invalid("SYNC_INCLUDE_SERIES must be true or false".to_string())
            })?,
        };

        Ok(Self {
            bind_addr,
            db_path,
            catalog: CatalogClientConfig::default()
                .with_base_url(trim_trailing(&catalog_url))
                .with_language(catalog_language)
                .with_timeout(Duration::from_secs(timeout_secs)),
            pass: PassConfig::default()
                .with_batch_size(usize::try_from(batch_size).unwrap_or(MAX_BATCH_SIZE))
                .with_concurrency(usize::try_from(concurrency).unwrap_or(MAX_CONCURRENCY))
                .with_include_series(include_series),
        })
    }
}

/// Integer variable with a default, rejected outside `range`
fn bounded(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
    range: std::ops::RangeInclusive<u64>,
) -> Result<u64, ConfigError> {
    let Some(raw) = optional_trimmed(lookup, name) else {
        return Ok(default);
    };
    let value = raw.parse::<u64>().map_err(|_| {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    })?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{name} must be in [{}, {}]",
            range.start(),
            range.end()
        )));
    }
    Ok(value)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn trim_trailing(value: &str) -> &str {
    value.trim_end_matches('/')
}
