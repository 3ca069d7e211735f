use std::path::Path;

use cardvault_core::db::SqliteCatalogRepository;
use cardvault_core::{filter_cards, CardListing, FilterCriteria};
use serde::Serialize;

use crate::commands::common::{open_database, truncate};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct CardListItem {
    pub id: String,
    pub name: String,
    pub set_id: String,
    pub set_name: String,
    pub series: Option<String>,
    pub local_id: String,
    pub category: String,
    pub rarity: Option<String>,
    pub price: Option<f64>,
}

pub fn list_cards(
    criteria: &FilterCriteria,
    limit: Option<usize>,
    db_path: &Path,
) -> Result<Vec<CardListing>, CliError> {
    let db = open_database(db_path)?;
    let conn = db.connection()?;
    let listings = SqliteCatalogRepository::new(&conn).list_card_listings()?;

    let limit = limit.unwrap_or(usize::MAX);
    Ok(filter_cards(&listings, criteria)
        .into_iter()
        .take(limit)
        .cloned()
        .collect())
}

pub fn run_cards(
    criteria: &FilterCriteria,
    limit: Option<usize>,
    as_json: bool,
    db_path: &Path,
) -> Result<(), CliError> {
    let listings = list_cards(criteria, limit, db_path)?;

    if as_json {
        let items = listings.iter().map(card_to_item).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if listings.is_empty() {
        println!("No cards match.");
        return Ok(());
    }

    for line in format_card_lines(&listings) {
        println!("{line}");
    }
    Ok(())
}

pub fn card_to_item(listing: &CardListing) -> CardListItem {
    let card = &listing.card;
    CardListItem {
        id: card.id.clone(),
        name: card.name.clone(),
        set_id: card.set_id.clone(),
        set_name: listing.set_name.clone(),
        series: listing.series.clone(),
        local_id: card.local_id.clone(),
        category: card.category.to_string(),
        rarity: card.rarity.clone(),
        price: card.headline_price(),
    }
}

pub fn format_card_lines(listings: &[CardListing]) -> Vec<String> {
    listings
        .iter()
        .map(|listing| {
            let card = &listing.card;
            let price = card
                .headline_price()
                .map_or_else(|| "-".to_string(), |price| format!("{price:.2}"));
            format!(
                "{:<16}  {:<28}  {} #{}  {}  {}",
                card.id,
                truncate(&card.name, 28),
                listing.set_name,
                card.local_id,
                card.rarity.as_deref().unwrap_or("-"),
                price
            )
        })
        .collect()
}
