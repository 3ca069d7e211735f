//! Storage seam used by the catalog sync engine

use std::sync::Arc;

use super::{
    Database, HoldingRepository, SqliteCatalogRepository, SqliteHoldingRepository,
    SqliteSyncRunRepository, StaleCard,
};
use crate::error::Result;
use crate::models::{Card, CardSet, Holding, HoldingId, PriceSample, SyncRun};

/// Identity of a pass recorded by [`CatalogStore::begin_pass`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassStart {
    pub run_id: i64,
    /// Rows with `synced_at` older than this were not touched by the pass
    pub epoch: i64,
}

/// Writes for one reconciliation batch, applied atomically
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcilePlan {
    /// Holdings to repoint at a surviving card
    pub migrations: Vec<(HoldingId, String)>,
    /// Cards to remove, with their remaining holdings and price history
    pub card_ids: Vec<String>,
    /// Sets to remove once their cards are gone
    pub set_ids: Vec<String>,
}

impl ReconcilePlan {
    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty() && self.card_ids.is_empty() && self.set_ids.is_empty()
    }
}

/// Row counts touched by one applied [`ReconcilePlan`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub holdings_migrated: usize,
    pub holdings_removed: usize,
    pub price_samples_removed: usize,
    pub cards_removed: usize,
    pub sets_removed: usize,
}

/// Storage operations the sync engine needs.
///
/// Every method is synchronous and bounded: one statement or one short
/// transaction. Implementations must not block on the network.
pub trait CatalogStore: Send + Sync {
    /// Record a new pass and allocate its epoch, strictly later than any
    /// earlier pass's epoch or stored `synced_at`, and no earlier than `now`
    fn begin_pass(&self, now: i64) -> Result<PassStart>;

    /// Store the terminal state of a pass
    fn finish_pass(&self, run: &SyncRun) -> Result<()>;

    /// Upsert set summaries
    fn upsert_sets(&self, sets: &[CardSet]) -> Result<()>;

    /// Upsert one set's detail, all of its cards and their price samples as
    /// a single unit
    fn write_set_members(&self, set: &CardSet, cards: &[Card], price_date: &str) -> Result<()>;

    fn obsolete_set_ids(&self, epoch: i64) -> Result<Vec<String>>;

    /// Cards under `set_ids` not written since `epoch`
    fn stale_cards(&self, set_ids: &[String], epoch: i64) -> Result<Vec<StaleCard>>;

    fn holdings_for_cards(&self, card_ids: &[String]) -> Result<Vec<Holding>>;

    /// Surviving card matching `card` by name, print number and set name
    fn find_successor(&self, card: &StaleCard, epoch: i64) -> Result<Option<String>>;

    /// Apply migrations, then delete holdings, price samples, cards and sets
    /// in that order
    fn apply_reconcile(&self, plan: &ReconcilePlan) -> Result<ReconcileOutcome>;
}

impl CatalogStore for Database {
    fn begin_pass(&self, now: i64) -> Result<PassStart> {
        let conn = self.connection()?;
        let runs = SqliteSyncRunRepository::new(&conn);
        let floor = runs
            .latest_epoch()?
            .into_iter()
            .chain(SqliteCatalogRepository::new(&conn).latest_synced_at()?)
            .max();
        let epoch = floor.map_or(now, |last| now.max(last.saturating_add(1)));
        let run_id = runs.start(epoch)?;
        Ok(PassStart { run_id, epoch })
    }

    fn finish_pass(&self, run: &SyncRun) -> Result<()> {
        let conn = self.connection()?;
        SqliteSyncRunRepository::new(&conn).finish(run)
    }

    fn upsert_sets(&self, sets: &[CardSet]) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let repo = SqliteCatalogRepository::new(&tx);
            for set in sets {
                repo.upsert_set(set)?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn write_set_members(&self, set: &CardSet, cards: &[Card], price_date: &str) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        {
            let repo = SqliteCatalogRepository::new(&tx);
            repo.upsert_set(set)?;
            for card in cards {
                repo.upsert_card(card)?;
                if let Some(sample) = PriceSample::from_card(card, price_date) {
                    repo.record_price_sample(&sample)?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn obsolete_set_ids(&self, epoch: i64) -> Result<Vec<String>> {
        let conn = self.connection()?;
        SqliteCatalogRepository::new(&conn).obsolete_set_ids(epoch)
    }

    fn stale_cards(&self, set_ids: &[String], epoch: i64) -> Result<Vec<StaleCard>> {
        let conn = self.connection()?;
        SqliteCatalogRepository::new(&conn).stale_cards(set_ids, epoch)
    }

    fn holdings_for_cards(&self, card_ids: &[String]) -> Result<Vec<Holding>> {
        let conn = self.connection()?;
        SqliteHoldingRepository::new(&conn).list_for_cards(card_ids)
    }

    fn find_successor(&self, card: &StaleCard, epoch: i64) -> Result<Option<String>> {
        let conn = self.connection()?;
        SqliteCatalogRepository::new(&conn).find_successor(card, epoch)
    }

    fn apply_reconcile(&self, plan: &ReconcilePlan) -> Result<ReconcileOutcome> {
        let mut conn = self.connection()?;
        let tx = conn.transaction()?;
        let outcome = {
            let holdings = SqliteHoldingRepository::new(&tx);
            let catalog = SqliteCatalogRepository::new(&tx);

            for (holding_id, card_id) in &plan.migrations {
                holdings.reassign(holding_id, card_id)?;
            }

            ReconcileOutcome {
                holdings_migrated: plan.migrations.len(),
                holdings_removed: holdings.delete_for_cards(&plan.card_ids)?,
                price_samples_removed: catalog.delete_price_samples(&plan.card_ids)?,
                cards_removed: catalog.delete_cards(&plan.card_ids)?,
                sets_removed: catalog.delete_sets(&plan.set_ids)?,
            }
        };
        tx.commit()?;
        Ok(outcome)
    }
}

impl<T: CatalogStore + ?Sized> CatalogStore for Arc<T> {
    fn begin_pass(&self, now: i64) -> Result<PassStart> {
        (**self).begin_pass(now)
    }

    fn finish_pass(&self, run: &SyncRun) -> Result<()> {
        (**self).finish_pass(run)
    }

    fn upsert_sets(&self, sets: &[CardSet]) -> Result<()> {
        (**self).upsert_sets(sets)
    }

    fn write_set_members(&self, set: &CardSet, cards: &[Card], price_date: &str) -> Result<()> {
        (**self).write_set_members(set, cards, price_date)
    }

    fn obsolete_set_ids(&self, epoch: i64) -> Result<Vec<String>> {
        (**self).obsolete_set_ids(epoch)
    }

    fn stale_cards(&self, set_ids: &[String], epoch: i64) -> Result<Vec<StaleCard>> {
        (**self).stale_cards(set_ids, epoch)
    }

    fn holdings_for_cards(&self, card_ids: &[String]) -> Result<Vec<Holding>> {
        (**self).holdings_for_cards(card_ids)
    }

    fn find_successor(&self, card: &StaleCard, epoch: i64) -> Result<Option<String>> {
        (**self).find_successor(card, epoch)
    }

    fn apply_reconcile(&self, plan: &ReconcilePlan) -> Result<ReconcileOutcome> {
        (**self).apply_reconcile(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteCatalogRepository;

    fn seed(db: &Database) {
        db.connection()
            .unwrap()
            .execute_batch(
                "INSERT INTO sets (id, name, synced_at) VALUES
                    ('old', 'Base Set', 1),
                    ('new', 'Base Set', 100);
                 INSERT INTO cards (id, set_id, local_id, name, category, synced_at) VALUES
                    ('old-4', 'old', '4', 'Charizard', 'Pokemon', 1),
                    ('old-5', 'old', '5', 'Clefairy', 'Pokemon', 1),
                    ('new-4', 'new', '4', 'Charizard', 'Pokemon', 100);
                 INSERT INTO price_history (card_id, date, cardmarket_avg) VALUES
                    ('old-4', '2024-01-01', 300.0);",
            )
            .unwrap();
    }

    #[test]
    fn test_begin_pass_epochs_strictly_increase() {
        let db = Database::open_in_memory().unwrap();

        let first = db.begin_pass(5_000).unwrap();
        let second = db.begin_pass(5_000).unwrap();
        let third = db.begin_pass(1_000).unwrap();

        assert_eq!(first.epoch, 5_000);
        assert_eq!(second.epoch, 5_001);
        assert_eq!(third.epoch, 5_002);
        assert_ne!(first.run_id, second.run_id);
    }

    #[test]
    fn test_begin_pass_epoch_passes_stored_rows() {
        let db = Database::open_in_memory().unwrap();
        let first = db.begin_pass(1_000).unwrap();
        assert_eq!(first.epoch, 1_000);

        let gone = CardSet {
            id: "gone".to_string(),
            name: "Gone Set".to_string(),
            series: None,
            card_count: 0,
            release_date: None,
            logo_url: None,
            symbol_url: None,
            synced_at: 1_003,
        };
        db.upsert_sets(&[gone]).unwrap();

        // Next pass starts on the same millisecond the row was written.
        let second = db.begin_pass(1_003).unwrap();
        assert_eq!(second.epoch, 1_004);
        assert_eq!(
            db.obsolete_set_ids(second.epoch).unwrap(),
            vec!["gone".to_string()]
        );
    }

    #[test]
    fn test_apply_reconcile_migrates_then_purges() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        let kept = Holding::new("old-4", 1, "holo");
        let lost = Holding::new("old-5", 2, "normal");
        {
            let conn = db.connection().unwrap();
            let repo = SqliteHoldingRepository::new(&conn);
            repo.add(&kept).unwrap();
            repo.add(&lost).unwrap();
        }

        let plan = ReconcilePlan {
            migrations: vec![(kept.id, "new-4".to_string())],
            card_ids: vec!["old-4".to_string(), "old-5".to_string()],
            set_ids: vec!["old".to_string()],
        };
        let outcome = db.apply_reconcile(&plan).unwrap();

        assert_eq!(
            outcome,
            ReconcileOutcome {
                holdings_migrated: 1,
                holdings_removed: 1,
                price_samples_removed: 1,
                cards_removed: 2,
                sets_removed: 1,
            }
        );

        let conn = db.connection().unwrap();
        let holdings = SqliteHoldingRepository::new(&conn).list().unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].card_id, "new-4");
        assert!(SqliteCatalogRepository::new(&conn)
            .get_set("old")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_apply_reconcile_rolls_back_on_failure() {
        let db = Database::open_in_memory().unwrap();
        seed(&db);

        // Deleting the set without its cards violates the foreign key.
        let plan = ReconcilePlan {
            migrations: Vec::new(),
            card_ids: vec!["old-5".to_string()],
            set_ids: vec!["old".to_string()],
        };
        assert!(db.apply_reconcile(&plan).is_err());

        let conn = db.connection().unwrap();
        let repo = SqliteCatalogRepository::new(&conn);
        assert!(repo.get_card("old-5").unwrap().is_some());
        assert!(repo.get_set("old").unwrap().is_some());
    }

    #[test]
    fn test_write_set_members_records_prices() {
        use crate::models::{CardCategory, GameplayAttributes, PricePoint, PriceVariants};

        let db = Database::open_in_memory().unwrap();
        let set = CardSet {
            id: "base1".to_string(),
            name: "Base Set".to_string(),
            series: None,
            card_count: 1,
            release_date: None,
            logo_url: None,
            symbol_url: None,
            synced_at: 10,
        };
        let mut cardmarket = PriceVariants::new();
        cardmarket.insert(
            "normal".to_string(),
            PricePoint {
                avg: Some(4.5),
                ..PricePoint::default()
            },
        );
        let card = Card {
            id: "base1-58".to_string(),
            set_id: "base1".to_string(),
            local_id: "58".to_string(),
            name: "Pikachu".to_string(),
            category: CardCategory::Pokemon,
            rarity: Some("Common".to_string()),
            hp: Some(40),
            types: vec!["Lightning".to_string()],
            stage: Some("Basic".to_string()),
            attributes: GameplayAttributes::default(),
            image_small: None,
            image_large: None,
            pricing_cardmarket: Some(cardmarket),
            pricing_tcgplayer: None,
            synced_at: 10,
        };

        db.write_set_members(&set, &[card], "2024-03-01").unwrap();

        let conn = db.connection().unwrap();
        let history = SqliteCatalogRepository::new(&conn)
            .price_history("base1-58")
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].cardmarket_avg, Some(4.5));
    }
}
