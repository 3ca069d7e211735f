//! Database migrations

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension};

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations
pub fn run(conn: &mut Connection) -> Result<()> {
    let version = get_version(conn)?;

    if version < 1 {
        migrate_v1(conn)?;
    }
    if version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

/// Get the current schema version
fn get_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .optional()?
        .unwrap_or(0);

    Ok(version)
}

/// Migration to version 1: catalog and collection schema
///
/// Foreign keys carry no cascading actions. Removing a set or card that is
/// still referenced fails, so reconciliation has to clear references first.
fn migrate_v1(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );

        CREATE TABLE IF NOT EXISTS sets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            series TEXT,
            card_count INTEGER NOT NULL DEFAULT 0,
            release_date TEXT,
            logo_url TEXT,
            symbol_url TEXT,
            synced_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sets_synced_at ON sets(synced_at);

        CREATE TABLE IF NOT EXISTS cards (
            id TEXT PRIMARY KEY,
            set_id TEXT NOT NULL REFERENCES sets(id),
            local_id TEXT NOT NULL,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            rarity TEXT,
            hp INTEGER,
            types TEXT NOT NULL DEFAULT '[]',
            stage TEXT,
            attributes TEXT NOT NULL DEFAULT '{}',
            image_small TEXT,
            image_large TEXT,
            pricing_cardmarket TEXT,
            pricing_tcgplayer TEXT,
            synced_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_cards_set_id ON cards(set_id);
        CREATE INDEX IF NOT EXISTS idx_cards_identity ON cards(name, local_id);
        CREATE INDEX IF NOT EXISTS idx_cards_synced_at ON cards(synced_at);

        CREATE TABLE IF NOT EXISTS collection_items (
            id TEXT PRIMARY KEY,
            card_id TEXT NOT NULL REFERENCES cards(id),
            quantity INTEGER NOT NULL DEFAULT 1,
            variant TEXT NOT NULL DEFAULT 'normal',
            notes TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_collection_items_card_id ON collection_items(card_id);

        CREATE TABLE IF NOT EXISTS price_history (
            card_id TEXT NOT NULL REFERENCES cards(id),
            date TEXT NOT NULL,
            cardmarket_avg REAL,
            tcgplayer_market REAL,
            PRIMARY KEY (card_id, date)
        );

        INSERT INTO schema_version (version) VALUES (1);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version 1");
    Ok(())
}

/// Migration to version 2: sync pass history
fn migrate_v2(conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS sync_runs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at INTEGER NOT NULL,
            finished_at INTEGER,
            status TEXT NOT NULL,
            sets_processed INTEGER NOT NULL DEFAULT 0,
            cards_processed INTEGER NOT NULL DEFAULT 0,
            sets_removed INTEGER NOT NULL DEFAULT 0,
            holdings_migrated INTEGER NOT NULL DEFAULT 0,
            warnings INTEGER NOT NULL DEFAULT 0
        );
        CREATE INDEX IF NOT EXISTS idx_sync_runs_started_at ON sync_runs(started_at DESC);

        INSERT INTO schema_version (version) VALUES (2);",
    )?;

    tx.commit()?;
    tracing::info!("Migrated database to version {CURRENT_VERSION}");
    Ok(())
}
