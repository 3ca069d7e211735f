//! Wire types of the external catalog provider.
//!
//! These mirror the provider's JSON as closely as needed and nothing more. The
//! mapper turns them into the local models.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::CatalogError;

/// Largest retreat cost a member record may declare
pub const MAX_RETREAT: u32 = 10;

/// Nominal card counts reported for a set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCount {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub official: Option<i64>,
}

/// Reference to a parent series
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub id: String,
    pub name: String,
}

/// Entry of the "list all sets" call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSetSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub card_count: Option<CardCount>,
    #[serde(default)]
    pub release_date: Option<String>,
    /// Filled from series metadata when requested
    #[serde(default)]
    pub serie: Option<SeriesRef>,
}

/// Series listing entry, and series detail with its sets
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExternalSeries {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sets: Vec<ExternalSetSummary>,
}

/// Result of the "set detail + members" call.
///
/// Member cards are kept as raw JSON so that one malformed card can be
/// rejected on its own without losing the rest of the set.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalSetDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub card_count: Option<CardCount>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub serie: Option<SeriesRef>,
    #[serde(default)]
    pub cards: Vec<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExternalAttack {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub cost: Vec<String>,
    /// Number or text such as `30+`
    #[serde(default)]
    pub damage: Option<Value>,
    #[serde(default)]
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExternalAbility {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExternalTypeModifier {
    #[serde(rename = "type")]
    pub energy_type: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalVariants {
    #[serde(default)]
    pub normal: bool,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub holo: bool,
    #[serde(default)]
    pub first_edition: bool,
}

/// Cardmarket block: flat fields, `-holo` suffixed for the holo finish
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExternalCardmarketPricing {
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub trend: Option<f64>,
    #[serde(default, rename = "avg-holo")]
    pub avg_holo: Option<f64>,
    #[serde(default, rename = "low-holo")]
    pub low_holo: Option<f64>,
    #[serde(default, rename = "trend-holo")]
    pub trend_holo: Option<f64>,
}

/// TCGplayer block: one object per finish next to `unit`/`updated` scalars
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExternalTcgplayerPricing {
    #[serde(flatten)]
    pub entries: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTcgplayerFinish {
    #[serde(default)]
    pub low_price: Option<f64>,
    #[serde(default)]
    pub mid_price: Option<f64>,
    #[serde(default)]
    pub high_price: Option<f64>,
    #[serde(default)]
    pub market_price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExternalPricing {
    #[serde(default)]
    pub cardmarket: Option<ExternalCardmarketPricing>,
    #[serde(default)]
    pub tcgplayer: Option<ExternalTcgplayerPricing>,
}

/// A member card as delivered by the provider
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalCard {
    pub id: String,
    pub local_id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    /// Number, or a numeric string in some locales
    #[serde(default)]
    pub hp: Option<Value>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub evolve_from: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub effect: Option<String>,
    #[serde(default)]
    pub illustrator: Option<String>,
    #[serde(default)]
    pub regulation_mark: Option<String>,
    #[serde(default)]
    pub attacks: Vec<ExternalAttack>,
    #[serde(default)]
    pub abilities: Vec<ExternalAbility>,
    #[serde(default)]
    pub weaknesses: Vec<ExternalTypeModifier>,
    #[serde(default)]
    pub resistances: Vec<ExternalTypeModifier>,
    /// Retreat cost as a count
    #[serde(default)]
    pub retreat: Option<u32>,
    #[serde(default)]
    pub variants: Option<ExternalVariants>,
    #[serde(default)]
    pub pricing: Option<ExternalPricing>,
}

impl ExternalCard {
    /// Validate one raw member record.
    pub fn from_value(value: &Value) -> Result<Self, CatalogError> {
        let card = Self::deserialize(value).map_err(|error| {
            let id = value
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or("<missing id>");
            CatalogError::InvalidRecord(format!("card {id}: {error}"))
        })?;

        if card.id.trim().is_empty() {
            return Err(CatalogError::InvalidRecord(
                "card with empty id".to_string(),
            ));
        }
        if card.name.trim().is_empty() {
            return Err(CatalogError::InvalidRecord(format!(
                "card {}: empty name",
                card.id
            )));
        }
        if let Some(retreat) = card.retreat.filter(|&retreat| retreat > MAX_RETREAT) {
            return Err(CatalogError::InvalidRecord(format!(
                "card {}: retreat cost {retreat} exceeds {MAX_RETREAT}",
                card.id
            )));
        }
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn from_value_accepts_minimal_card() {
        let card = ExternalCard::from_value(&json!({
            "id": "base1-1",
            "localId": "1",
            "name": "Alakazam",
            "category": "Pokemon"
        }))
        .unwrap();
        assert_eq!(card.local_id, "1");
        assert!(card.pricing.is_none());
        assert!(card.attacks.is_empty());
    }

    #[test]
    fn from_value_rejects_missing_required_fields() {
        let error = ExternalCard::from_value(&json!({
            "id": "base1-2",
            "category": "Pokemon"
        }))
        .unwrap_err();
        assert!(matches!(error, CatalogError::InvalidRecord(_)));
        assert!(error.to_string().contains("base1-2"));
    }

    #[test]
    fn from_value_rejects_blank_name() {
        let error = ExternalCard::from_value(&json!({
            "id": "base1-3",
            "localId": "3",
            "name": "  ",
            "category": "Pokemon"
        }))
        .unwrap_err();
        assert!(matches!(error, CatalogError::InvalidRecord(_)));
    }

    #[test]
    fn from_value_bounds_retreat_cost() {
        let record = |retreat: u64| {
            json!({
                "id": "base1-4",
                "localId": "4",
                "name": "Charizard",
                "category": "Pokemon",
                "retreat": retreat
            })
        };

        let card = ExternalCard::from_value(&record(u64::from(MAX_RETREAT))).unwrap();
        assert_eq!(card.retreat, Some(MAX_RETREAT));

        let error = ExternalCard::from_value(&record(4_000_000_000)).unwrap_err();
        assert!(matches!(error, CatalogError::InvalidRecord(_)));
        assert!(error.to_string().contains("retreat"));
    }

    #[test]
    fn tcgplayer_block_keeps_scalar_and_finish_entries() {
        let pricing: ExternalPricing = serde_json::from_value(json!({
            "tcgplayer": {
                "unit": "USD",
                "holofoil": { "marketPrice": 310.5, "lowPrice": 250.0 }
            }
        }))
        .unwrap();
        let tcg = pricing.tcgplayer.unwrap();
        assert!(tcg.entries.contains_key("unit"));
        assert!(tcg.entries["holofoil"].is_object());
    }
}
