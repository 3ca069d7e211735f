//! Sync run history repository

#![allow(clippy::cast_possible_wrap)] // SQLite uses i64 for LIMIT

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{SyncRun, SyncRunStatus};

const RUN_COLUMNS: &str = "id, started_at, finished_at, status, sets_processed, cards_processed, \
     sets_removed, holdings_migrated, warnings";

/// `SQLite` access to the `sync_runs` table
pub struct SqliteSyncRunRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteSyncRunRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a running pass whose epoch is `started_at`; returns the row id
    pub fn start(&self, started_at: i64) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sync_runs (started_at, status) VALUES (?1, ?2)",
            params![started_at, SyncRunStatus::Running.as_str()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Store the terminal state and counters of a pass
    pub fn finish(&self, run: &SyncRun) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_runs SET
                finished_at = ?1,
                status = ?2,
                sets_processed = ?3,
                cards_processed = ?4,
                sets_removed = ?5,
                holdings_migrated = ?6,
                warnings = ?7
             WHERE id = ?8",
            params![
                run.finished_at,
                run.status.as_str(),
                run.sets_processed,
                run.cards_processed,
                run.sets_removed,
                run.holdings_migrated,
                run.warnings,
                run.id
            ],
        )?;
        Ok(())
    }

    /// Epoch of the most recent pass, if any
    pub fn latest_epoch(&self) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row("SELECT MAX(started_at) FROM sync_runs", [], |row| row.get(0))?)
    }

    /// Most recent pass
    pub fn latest(&self) -> Result<Option<SyncRun>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT 1"),
                [],
                parse_run,
            )
            .optional()?;
        Ok(run)
    }

    /// Recent passes, newest first
    pub fn list(&self, limit: usize) -> Result<Vec<SyncRun>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {RUN_COLUMNS} FROM sync_runs ORDER BY started_at DESC, id DESC LIMIT ?1"
        ))?;
        let runs = stmt
            .query_map(params![limit as i64], parse_run)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(runs)
    }
}

fn parse_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncRun> {
    Ok(SyncRun {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        status: SyncRunStatus::parse(&row.get::<_, String>(3)?),
        sets_processed: row.get(4)?,
        cards_processed: row.get(5)?,
        sets_removed: row.get(6)?,
        holdings_migrated: row.get(7)?,
        warnings: row.get(8)?,
    })
}
