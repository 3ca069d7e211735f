use std::path::Path;

use cardvault_core::db::{HoldingRepository, SqliteCatalogRepository, SqliteHoldingRepository};
use cardvault_core::Holding;
use serde::Serialize;

use crate::commands::common::{format_timestamp, normalize_card_id, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct HoldingListItem {
    pub id: String,
    pub card_id: String,
    pub card_name: Option<String>,
    pub quantity: i64,
    pub variant: String,
    pub notes: Option<String>,
    pub updated_at: i64,
}

pub fn add_holding(
    card_id: &str,
    quantity: i64,
    variant: &str,
    notes: Option<&str>,
    db_path: &Path,
) -> Result<Holding, CliError> {
    let card_id = normalize_card_id(card_id)?;
    let mut holding = Holding::new(card_id, quantity, variant.trim());
    if let Some(notes) = notes.map(str::trim).filter(|notes| !notes.is_empty()) {
        holding = holding.with_notes(notes);
    }

    let db = open_database(db_path)?;
    let conn = db.connection()?;
    SqliteHoldingRepository::new(&conn).add(&holding)?;
    Ok(holding)
}

pub fn list_holdings(db_path: &Path) -> Result<Vec<HoldingListItem>, CliError> {
    let db = open_database(db_path)?;
    let conn = db.connection()?;
    let catalog = SqliteCatalogRepository::new(&conn);

    SqliteHoldingRepository::new(&conn)
        .list()?
        .into_iter()
        .map(|holding| -> Result<HoldingListItem, CliError> {
            let card_name = catalog.get_card(&holding.card_id)?.map(|card| card.name);
            Ok(HoldingListItem {
                id: holding.id.to_string(),
                card_id: holding.card_id,
                card_name,
                quantity: holding.quantity,
                variant: holding.variant,
                notes: holding.notes,
                updated_at: holding.updated_at,
            })
        })
        .collect()
}

pub fn run_holdings_add(
    card_id: &str,
    quantity: i64,
    variant: &str,
    notes: Option<&str>,
    db_path: &Path,
) -> Result<(), CliError> {
    let holding = add_holding(card_id, quantity, variant, notes, db_path)?;
    println!(
        "Added {}x {} ({}) as {}",
        holding.quantity, holding.card_id, holding.variant, holding.id
    );
    Ok(())
}

pub fn run_holdings_list(as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let items = list_holdings(db_path)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        println!("No holdings recorded.");
        return Ok(());
    }

    for line in format_holding_lines(&items) {
        println!("{line}");
    }
    Ok(())
}

pub fn format_holding_lines(items: &[HoldingListItem]) -> Vec<String> {
    items
        .iter()
        .map(|item| {
            let short_id = item.id.chars().take(13).collect::<String>();
            format!(
                "{short_id}  {:>3}x  {:<16}  {:<8}  {}  updated {}",
                item.quantity,
                item.card_id,
                item.variant,
                item.card_name.as_deref().unwrap_or("?"),
                format_timestamp(item.updated_at)
            )
        })
        .collect()
}
