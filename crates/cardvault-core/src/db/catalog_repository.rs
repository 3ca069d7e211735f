//! Catalog repository: sets, cards and price history

use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{placeholders, MAX_IN_PARAMS};
use crate::error::Result;
use crate::models::{Card, CardCategory, CardListing, CardSet, PriceSample};

const CARD_COLUMNS: &str = "c.id, c.set_id, c.local_id, c.name, c.category, c.rarity, c.hp, \
     c.types, c.stage, c.attributes, c.image_small, c.image_large, \
     c.pricing_cardmarket, c.pricing_tcgplayer, c.synced_at";

const SET_COLUMNS: &str =
    "id, name, series, card_count, release_date, logo_url, symbol_url, synced_at";

/// A card that was not rewritten by the current pass, with the identity
/// fields used to look for its successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleCard {
    pub id: String,
    pub set_id: String,
    /// Display name of the card's set
    pub set_name: String,
    pub name: String,
    pub local_id: String,
}

/// `SQLite` access to catalog tables. Accepts a plain connection or a
/// transaction (which derefs to one).
pub struct SqliteCatalogRepository<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteCatalogRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert or refresh a set.
    ///
    /// Optional display fields the incoming row lacks keep their stored value,
    /// so a summary listing never erases what a detail fetch wrote.
    pub fn upsert_set(&self, set: &CardSet) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sets (id, name, series, card_count, release_date, logo_url, symbol_url, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                series = COALESCE(excluded.series, sets.series),
                card_count = excluded.card_count,
                release_date = COALESCE(excluded.release_date, sets.release_date),
                logo_url = COALESCE(excluded.logo_url, sets.logo_url),
                symbol_url = COALESCE(excluded.symbol_url, sets.symbol_url),
                synced_at = excluded.synced_at",
            params![
                set.id,
                set.name,
                set.series,
                set.card_count,
                set.release_date,
                set.logo_url,
                set.symbol_url,
                set.synced_at
            ],
        )?;
        Ok(())
    }

    /// Insert or refresh a card, including gameplay, pricing and image fields
    pub fn upsert_card(&self, card: &Card) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cards (id, set_id, local_id, name, category, rarity, hp, types, stage,
                                attributes, image_small, image_large, pricing_cardmarket,
                                pricing_tcgplayer, synced_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                set_id = excluded.set_id,
                local_id = excluded.local_id,
                name = excluded.name,
                category = excluded.category,
                rarity = excluded.rarity,
                hp = excluded.hp,
                types = excluded.types,
                stage = excluded.stage,
                attributes = excluded.attributes,
                image_small = excluded.image_small,
                image_large = excluded.image_large,
                pricing_cardmarket = excluded.pricing_cardmarket,
                pricing_tcgplayer = excluded.pricing_tcgplayer,
                synced_at = excluded.synced_at",
            params![
                card.id,
                card.set_id,
                card.local_id,
                card.name,
                card.category.as_str(),
                card.rarity,
                card.hp,
                serde_json::to_string(&card.types)?,
                card.stage,
                serde_json::to_string(&card.attributes)?,
                card.image_small,
                card.image_large,
                to_json_option(card.pricing_cardmarket.as_ref())?,
                to_json_option(card.pricing_tcgplayer.as_ref())?,
                card.synced_at
            ],
        )?;
        Ok(())
    }

    /// Store the day's price observation, replacing an earlier one for the
    /// same card and day
    pub fn record_price_sample(&self, sample: &PriceSample) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO price_history (card_id, date, cardmarket_avg, tcgplayer_market)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.card_id,
                sample.date,
                sample.cardmarket_avg,
                sample.tcgplayer_market
            ],
        )?;
        Ok(())
    }

    pub fn get_set(&self, id: &str) -> Result<Option<CardSet>> {
        let set = self
            .conn
            .query_row(
                &format!("SELECT {SET_COLUMNS} FROM sets WHERE id = ?1"),
                params![id],
                parse_set,
            )
            .optional()?;
        Ok(set)
    }

    /// All sets, ordered by release date then identifier
    pub fn list_sets(&self) -> Result<Vec<CardSet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SET_COLUMNS} FROM sets ORDER BY release_date IS NULL, release_date, id"
        ))?;
        let sets = stmt
            .query_map([], parse_set)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sets)
    }

    pub fn get_card(&self, id: &str) -> Result<Option<Card>> {
        let card = self
            .conn
            .query_row(
                &format!("SELECT {CARD_COLUMNS} FROM cards c WHERE c.id = ?1"),
                params![id],
                parse_card,
            )
            .optional()?;
        Ok(card)
    }

    /// Cards of one set, or of the whole catalog when `set_id` is `None`
    pub fn list_cards(&self, set_id: Option<&str>) -> Result<Vec<Card>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS} FROM cards c
             WHERE ?1 IS NULL OR c.set_id = ?1
             ORDER BY c.set_id, c.id"
        ))?;
        let cards = stmt
            .query_map(params![set_id], parse_card)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(cards)
    }

    /// Every card joined with its set's name and series
    pub fn list_card_listings(&self) -> Result<Vec<CardListing>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CARD_COLUMNS}, s.name, s.series
             FROM cards c
             JOIN sets s ON s.id = c.set_id
             ORDER BY c.set_id, c.id"
        ))?;
        let listings = stmt
            .query_map([], |row| {
                Ok(CardListing {
                    card: parse_card(row)?,
                    set_name: row.get(15)?,
                    series: row.get(16)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(listings)
    }

    /// Price history of one card, oldest first
    pub fn price_history(&self, card_id: &str) -> Result<Vec<PriceSample>> {
        let mut stmt = self.conn.prepare(
            "SELECT card_id, date, cardmarket_avg, tcgplayer_market
             FROM price_history
             WHERE card_id = ?1
             ORDER BY date",
        )?;
        let samples = stmt
            .query_map(params![card_id], |row| {
                Ok(PriceSample {
                    card_id: row.get(0)?,
                    date: row.get(1)?,
                    cardmarket_avg: row.get(2)?,
                    tcgplayer_market: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(samples)
    }

    /// Sets not written since `epoch`
    pub fn obsolete_set_ids(&self, epoch: i64) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM sets WHERE synced_at < ?1 ORDER BY id")?;
        let ids = stmt
            .query_map(params![epoch], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Cards under `set_ids` not written since `epoch`
    pub fn stale_cards(&self, set_ids: &[String], epoch: i64) -> Result<Vec<StaleCard>> {
        let mut stale = Vec::new();
        for chunk in set_ids.chunks(MAX_IN_PARAMS) {
            let mut stmt = self.conn.prepare(&format!(
                "SELECT c.id, c.set_id, s.name, c.name, c.local_id
                 FROM cards c
                 JOIN sets s ON s.id = c.set_id
                 WHERE c.set_id IN ({}) AND c.synced_at < ?
                 ORDER BY c.id",
                placeholders(chunk.len())
            ))?;
            let values = chunk
                .iter()
                .map(|id| rusqlite::types::Value::from(id.clone()))
                .chain(std::iter::once(rusqlite::types::Value::from(epoch)));
            let rows = stmt.query_map(params_from_iter(values), |row| {
                Ok(StaleCard {
                    id: row.get(0)?,
                    set_id: row.get(1)?,
                    set_name: row.get(2)?,
                    name: row.get(3)?,
                    local_id: row.get(4)?,
                })
            })?;
            for row in rows {
                stale.push(row?);
            }
        }
        Ok(stale)
    }

    /// First card written since `epoch` with the same name, print number and
    /// set display name as `card`
    pub fn find_successor(&self, card: &StaleCard, epoch: i64) -> Result<Option<String>> {
        let id = self
            .conn
            .query_row(
                "SELECT c.id
                 FROM cards c
                 JOIN sets s ON s.id = c.set_id
                 WHERE c.name = ?1 AND c.local_id = ?2 AND s.name = ?3
                   AND c.synced_at >= ?4 AND c.id <> ?5
                 ORDER BY c.id
                 LIMIT 1",
                params![card.name, card.local_id, card.set_name, epoch, card.id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Remove price history of the given cards
    pub fn delete_price_samples(&self, card_ids: &[String]) -> Result<usize> {
        self.delete_in("price_history", "card_id", card_ids)
    }

    /// Remove the given cards (references must already be gone)
    pub fn delete_cards(&self, card_ids: &[String]) -> Result<usize> {
        self.delete_in("cards", "id", card_ids)
    }

    /// Remove the given sets (member cards must already be gone)
    pub fn delete_sets(&self, set_ids: &[String]) -> Result<usize> {
        self.delete_in("sets", "id", set_ids)
    }

    /// Newest `synced_at` across sets and cards
    pub fn latest_synced_at(&self) -> Result<Option<i64>> {
        Ok(self.conn.query_row(
            "SELECT MAX(synced_at) FROM (
                SELECT MAX(synced_at) AS synced_at FROM sets
                UNION ALL
                SELECT MAX(synced_at) FROM cards
             )",
            [],
            |row| row.get(0),
        )?)
    }

    pub fn count_sets(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sets", [], |row| row.get(0))?)
    }

    pub fn count_cards(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM cards", [], |row| row.get(0))?)
    }

    fn delete_in(&self, table: &str, column: &str, ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for chunk in ids.chunks(MAX_IN_PARAMS) {
            removed += self.conn.execute(
                &format!(
                    "DELETE FROM {table} WHERE {column} IN ({})",
                    placeholders(chunk.len())
                ),
                params_from_iter(chunk.iter()),
            )?;
        }
        Ok(removed)
    }
}

fn parse_set(row: &Row<'_>) -> rusqlite::Result<CardSet> {
    Ok(CardSet {
        id: row.get(0)?,
        name: row.get(1)?,
        series: row.get(2)?,
        card_count: row.get(3)?,
        release_date: row.get(4)?,
        logo_url: row.get(5)?,
        symbol_url: row.get(6)?,
        synced_at: row.get(7)?,
    })
}

fn parse_card(row: &Row<'_>) -> rusqlite::Result<Card> {
    Ok(Card {
        id: row.get(0)?,
        set_id: row.get(1)?,
        local_id: row.get(2)?,
        name: row.get(3)?,
        category: CardCategory::from(row.get::<_, String>(4)?),
        rarity: row.get(5)?,
        hp: row.get(6)?,
        types: json_column(row, 7)?,
        stage: row.get(8)?,
        attributes: json_column(row, 9)?,
        image_small: row.get(10)?,
        image_large: row.get(11)?,
        pricing_cardmarket: optional_json_column(row, 12)?,
        pricing_tcgplayer: optional_json_column(row, 13)?,
        synced_at: row.get(14)?,
    })
}

fn to_json_option<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn optional_json_column<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|raw| {
        serde_json::from_str(&raw)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}
