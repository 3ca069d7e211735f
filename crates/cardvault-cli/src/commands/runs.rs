use std::path::Path;

use cardvault_core::db::SqliteSyncRunRepository;
use cardvault_core::SyncRun;

use crate::commands::common::{format_timestamp, open_database};
use crate::error::CliError;

pub fn list_runs(limit: usize, db_path: &Path) -> Result<Vec<SyncRun>, CliError> {
    let db = open_database(db_path)?;
    let conn = db.connection()?;
    Ok(SqliteSyncRunRepository::new(&conn).list(limit)?)
}

pub fn run_runs(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let runs = list_runs(limit, db_path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&runs)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("No sync passes recorded.");
        return Ok(());
    }

    for line in format_run_lines(&runs) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_run_lines(runs: &[SyncRun]) -> Vec<String> {
    runs.iter()
        .map(|run| {
            format!(
                "{}  {:<9}  sets={} cards={} removed={} migrated={} warnings={}",
                format_timestamp(run.started_at),
                run.status.as_str(),
                run.sets_processed,
                run.cards_processed,
                run.sets_removed,
                run.holdings_migrated,
                run.warnings
            )
        })
        .collect()
}
