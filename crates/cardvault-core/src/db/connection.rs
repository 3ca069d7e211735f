//! Database connection management

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::Connection;

use super::migrations;
use crate::error::{Error, Result};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database wrapper around a single `SQLite` connection.
///
/// The connection sits behind a mutex so the handle can be shared by the API
/// server and a running sync pass. Callers lock for one statement or one short
/// transaction and never hold the guard across an `.await`.
pub struct Database {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl Database {
    /// Open a database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        tracing::debug!(path = %path.display(), "Opened catalog database");
        Self::from_connection(conn, Some(path))
    }

    /// Open an in-memory database (useful for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn, None)
    }

    fn from_connection(mut conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        Self::configure(&conn)?;
        migrations::run(&mut conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
        })
    }

    /// Configure `SQLite` pragmas
    fn configure(conn: &Connection) -> Result<()> {
        // WAL is unavailable for in-memory databases; keep the default there.
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })
        .ok();
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(())
    }

    /// Lock the underlying connection
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("database connection mutex poisoned".to_string()))
    }

    /// Filesystem path, `None` for in-memory databases
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.path().is_none());

        let conn = db.connection().unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("nested").join("cardvault.db");

        let db = Database::open(&db_path).unwrap();
        assert_eq!(db.path(), Some(db_path.as_path()));
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_keeps_data() {
        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("cardvault.db");

        {
            let db = Database::open(&db_path).unwrap();
            db.connection()
                .unwrap()
                .execute(
                    "INSERT INTO sets (id, name, card_count, synced_at) VALUES ('base1', 'Base Set', 102, 1)",
                    [],
                )
                .unwrap();
        }

        let db = Database::open(&db_path).unwrap();
        let name: String = db
            .connection()
            .unwrap()
            .query_row("SELECT name FROM sets WHERE id = 'base1'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "Base Set");
    }
}
