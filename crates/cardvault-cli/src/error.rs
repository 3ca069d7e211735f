use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] cardvault_core::Error),
    #[error(transparent)]
    Catalog(#[from] cardvault_core::CatalogError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Card id cannot be empty")]
    EmptyCardId,
    #[error("Sync cancelled; run it again to finish")]
    Cancelled,
}
