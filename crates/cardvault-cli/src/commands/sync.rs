use std::path::Path;

use cardvault_core::{Error, HttpCatalogClient, ProgressReporter, SyncEngine, SyncEvent};
use tokio_util::sync::CancellationToken;

use crate::cli::SyncArgs;
use crate::commands::common::open_database;
use crate::error::CliError;

/// Prints pass events as they arrive
pub struct TerminalReporter {
    json: bool,
}

impl TerminalReporter {
    pub const fn new(json: bool) -> Self {
        Self { json }
    }
}

impl ProgressReporter for TerminalReporter {
    fn report(&self, event: SyncEvent) {
        if self.json {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::warn!(error = %e, "Failed to encode sync event"),
            }
            return;
        }

        match &event {
            SyncEvent::Warning { .. } => eprintln!("{}", format_event(&event)),
            // The caller prints the error it gets back from the pass
            SyncEvent::Error { .. } => {}
            _ => println!("{}", format_event(&event)),
        }
    }
}

pub fn format_event(event: &SyncEvent) -> String {
    match event {
        SyncEvent::Starting { message } => message.clone(),
        SyncEvent::Progress {
            message, progress, ..
        } => format!("[{progress:>3}%] {message}"),
        SyncEvent::Warning {
            message,
            set_id: Some(set_id),
        } => format!("warning [{set_id}]: {message}"),
        SyncEvent::Warning {
            message,
            set_id: None,
        } => format!("warning: {message}"),
        SyncEvent::Complete { message, stats } => {
            if stats.warnings == 0 {
                message.clone()
            } else {
                format!("{message} ({} warnings)", stats.warnings)
            }
        }
        SyncEvent::Error { message } => format!("error: {message}"),
    }
}

pub async fn run_sync(args: &SyncArgs, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let catalog = HttpCatalogClient::new(&args.catalog_config())?;
    let engine = SyncEngine::new(catalog, db, args.pass_config());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Stopping after the set in flight...");
            on_interrupt.cancel();
        }
    });

    let reporter = TerminalReporter::new(args.json);
    match engine.run(&reporter, &cancel).await {
        Ok(_) => Ok(()),
        Err(Error::Cancelled) => Err(CliError::Cancelled),
        Err(e) => Err(e.into()),
    }
}
