//! Holding (collection item) repository

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use super::{placeholders, MAX_IN_PARAMS};
use crate::error::{Error, Result};
use crate::models::{Holding, HoldingId};

const HOLDING_COLUMNS: &str = "id, card_id, quantity, variant, notes, created_at, updated_at";

/// Trait for holding storage operations
pub trait HoldingRepository {
    /// Store a new holding; the referenced card must exist
    fn add(&self, holding: &Holding) -> Result<()>;

    /// Get a holding by ID
    fn get(&self, id: &HoldingId) -> Result<Option<Holding>>;

    /// List all holdings, newest first
    fn list(&self) -> Result<Vec<Holding>>;

    /// Holdings referencing any of the given cards
    fn list_for_cards(&self, card_ids: &[String]) -> Result<Vec<Holding>>;

    /// Point a holding at another card
    fn reassign(&self, id: &HoldingId, card_id: &str) -> Result<()>;

    /// Delete every holding referencing one of the given cards
    fn delete_for_cards(&self, card_ids: &[String]) -> Result<usize>;

    fn count(&self) -> Result<i64>;
}

/// `SQLite` implementation of `HoldingRepository`
pub struct SqliteHoldingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteHoldingRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a holding from a database row
    fn parse_holding(row: &rusqlite::Row<'_>) -> rusqlite::Result<Holding> {
        let id: String = row.get(0)?;
        Ok(Holding {
            id: id.parse().unwrap_or_default(),
            card_id: row.get(1)?,
            quantity: row.get(2)?,
            variant: row.get(3)?,
            notes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
}

impl HoldingRepository for SqliteHoldingRepository<'_> {
    fn add(&self, holding: &Holding) -> Result<()> {
        if holding.quantity < 1 {
            return Err(Error::InvalidInput(
                "Holding quantity must be at least 1".into(),
            ));
        }

        let card_exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cards WHERE id = ?1)",
            params![holding.card_id],
            |row| row.get(0),
        )?;
        if !card_exists {
            return Err(Error::NotFound(format!("card {}", holding.card_id)));
        }

        self.conn.execute(
            "INSERT INTO collection_items (id, card_id, quantity, variant, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                holding.id.as_str(),
                holding.card_id,
                holding.quantity,
                holding.variant,
                holding.notes,
                holding.created_at,
                holding.updated_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &HoldingId) -> Result<Option<Holding>> {
        let holding = self
            .conn
            .query_row(
                &format!("SELECT {HOLDING_COLUMNS} FROM collection_items WHERE id = ?1"),
                params![id.as_str()],
                Self::parse_holding,
            )
            .optional()?;
        Ok(holding)
    }

    fn list(&self) -> Result<Vec<Holding>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {HOLDING_COLUMNS} FROM collection_items ORDER BY created_at DESC, id DESC"
        ))?;
        let holdings = stmt
            .query_map([], Self::parse_holding)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(holdings)
    }

    fn list_for_cards(&self, card_ids: &[String]) -> Result<Vec<Holding>> {
        let mut holdings = Vec::new();
        for chunk in card_ids.chunks(MAX_IN_PARAMS) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT {HOLDING_COLUMNS} FROM collection_items
                 WHERE card_id IN ({})
                 ORDER BY id",
                placeholders(chunk.len())
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), Self::parse_holding)?;
            for row in rows {
                holdings.push(row?);
            }
        }
        Ok(holdings)
    }

    fn reassign(&self, id: &HoldingId, card_id: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();

        let rows = self.conn.execute(
            "UPDATE collection_items SET card_id = ?1, updated_at = ?2 WHERE id = ?3",
            params![card_id, now, id.as_str()],
        )?;

        if rows == 0 {
            return Err(Error::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete_for_cards(&self, card_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for chunk in card_ids.chunks(MAX_IN_PARAMS) {
            removed += self.conn.execute(
                &format!(
                    "DELETE FROM collection_items WHERE card_id IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(removed)
    }

    fn count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM collection_items", [], |row| row.get(0))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.connection()
            .unwrap()
            .execute_batch(
                "INSERT INTO sets (id, name, synced_at) VALUES ('base1', 'Base Set', 1);
                 INSERT INTO cards (id, set_id, local_id, name, category, synced_at) VALUES
                    ('base1-4', 'base1', '4', 'Charizard', 'Pokemon', 1),
                    ('base1-15', 'base1', '15', 'Venusaur', 'Pokemon', 1);",
            )
            .unwrap();
        db
    }

    #[test]
    fn test_add_and_get() {
        let db = setup();
        let conn = db.connection().unwrap();
        let repo = SqliteHoldingRepository::new(&conn);

        let holding = Holding::new("base1-4", 2, "holo").with_notes("first print");
        repo.add(&holding).unwrap();

        let fetched = repo.get(&holding.id).unwrap().unwrap();
        assert_eq!(fetched, holding);
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_add_rejects_unknown_card() {
        let db = setup();
        let conn = db.connection().unwrap();
        let repo = SqliteHoldingRepository::new(&conn);

        let result = repo.add(&Holding::new("jungle-1", 1, "normal"));
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_add_rejects_empty_quantity() {
        let db = setup();
        let conn = db.connection().unwrap();
        let repo = SqliteHoldingRepository::new(&conn);

        let result = repo.add(&Holding::new("base1-4", 0, "normal"));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_reassign_and_delete_for_cards() {
        let db = setup();
        let conn = db.connection().unwrap();
        let repo = SqliteHoldingRepository::new(&conn);

        let first = Holding::new("base1-4", 1, "normal");
        let second = Holding::new("base1-4", 3, "holo");
        repo.add(&first).unwrap();
        repo.add(&second).unwrap();

        repo.reassign(&first.id, "base1-15").unwrap();
        let moved = repo.list_for_cards(&["base1-15".to_string()]).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].id, first.id);

        let removed = repo.delete_for_cards(&["base1-4".to_string()]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(repo.list().unwrap().len(), 1);
    }

    #[test]
    fn test_reassign_missing_holding() {
        let db = setup();
        let conn = db.connection().unwrap();
        let repo = SqliteHoldingRepository::new(&conn);

        let result = repo.reassign(&HoldingId::new(), "base1-4");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }
}
