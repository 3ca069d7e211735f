use std::path::PathBuf;
use std::time::Duration;

use cardvault_core::sync::{DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY};
use cardvault_core::{CatalogClientConfig, FilterCriteria, PassConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cardvault")]
#[command(about = "Keep a local trading-card catalog in step with its provider")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one full catalog sync pass (Ctrl-C stops after the current set)
    Sync(SyncArgs),
    /// List catalog cards
    Cards {
        #[command(flatten)]
        filter: CardFilterArgs,
        /// Maximum number of cards to show
        #[arg(short, long)]
        limit: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage owned cards
    Holdings {
        #[command(subcommand)]
        command: HoldingCommands,
    },
    /// Show recent sync passes
    Runs {
        /// Number of passes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Catalog API root without the language segment
    #[arg(long, value_name = "URL")]
    pub catalog_url: Option<String>,
    /// Catalog language
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout: Option<u64>,
    /// Obsolete sets handled per reconcile batch
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,
    /// Concurrent set fetches
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
    /// Skip the series lookup while discovering sets
    #[arg(long)]
    pub no_series: bool,
    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

impl SyncArgs {
    pub fn catalog_config(&self) -> CatalogClientConfig {
        let mut config = CatalogClientConfig::default();
        if let Some(url) = &self.catalog_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(language) = &self.language {
            config = config.with_language(language.clone());
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }

    pub fn pass_config(&self) -> PassConfig {
        PassConfig::default()
            .with_batch_size(self.batch_size)
            .with_concurrency(self.concurrency)
            .with_include_series(!self.no_series)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct CardFilterArgs {
    /// Exact set id
    #[arg(long = "set", value_name = "SET_ID")]
    pub set_id: Option<String>,
    /// Series name
    #[arg(long)]
    pub series: Option<String>,
    /// Substring of the card name
    #[arg(long)]
    pub name: Option<String>,
    /// Any of these name substrings (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub names: Vec<String>,
    /// Any of these rarities (repeatable or comma separated)
    #[arg(long = "rarity", value_delimiter = ',')]
    pub rarities: Vec<String>,
    /// Card category (Pokemon, Trainer, Energy)
    #[arg(long)]
    pub category: Option<String>,
    /// Evolution stage (Basic, Stage1, ...)
    #[arg(long)]
    pub stage: Option<String>,
}

impl CardFilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            set_id: self.set_id.clone(),
            series: self.series.clone(),
            name: self.name.clone(),
            names: (!self.names.is_empty()).then(|| self.names.clone()),
            rarities: (!self.rarities.is_empty()).then(|| self.rarities.clone()),
            category: self.category.clone(),
            stage: self.stage.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum HoldingCommands {
    /// Record owned copies of a card
    Add {
        /// Catalog card id
        card_id: String,
        /// Number of copies
        #[arg(short, long, default_value = "1")]
        quantity: i64,
        /// Print finish (normal, holo, reverse, ...)
        #[arg(long, default_value = "normal")]
        variant: String,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List owned cards
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
