//! Catalog card model

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Token used for one unit of a generic (colorless) energy cost.
pub const GENERIC_COST: &str = "Colorless";

/// Broad card taxonomy reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CardCategory {
    /// Creature cards
    Pokemon,
    /// Trainer cards (items, supporters, stadiums)
    Trainer,
    /// Energy cards
    Energy,
    /// Anything the provider adds later
    Other(String),
}

impl CardCategory {
    /// Stable label stored in the database
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pokemon => "Pokemon",
            Self::Trainer => "Trainer",
            Self::Energy => "Energy",
            Self::Other(label) => label,
        }
    }

    /// Case-insensitive comparison against a user-supplied label
    pub fn matches_label(&self, label: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(label.trim())
    }
}

impl From<String> for CardCategory {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pokemon" | "pokémon" => Self::Pokemon,
            "trainer" => Self::Trainer,
            "energy" => Self::Energy,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<CardCategory> for String {
    fn from(value: CardCategory) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for CardCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One price observation for a print finish.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mid: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<f64>,
}

impl PricePoint {
    /// True when no field carries a value
    pub const fn is_empty(&self) -> bool {
        self.low.is_none()
            && self.mid.is_none()
            && self.high.is_none()
            && self.market.is_none()
            && self.avg.is_none()
            && self.trend.is_none()
    }
}

/// Prices from one market source keyed by print finish (`normal`, `holo`, ...).
pub type PriceVariants = BTreeMap<String, PricePoint>;

/// A single attack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    #[serde(default)]
    pub cost: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

/// A passive ability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
}

/// Weakness or resistance against an energy type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeModifier {
    #[serde(rename = "type")]
    pub energy_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Gameplay attributes of a card. Every field is optional or defaults to empty;
/// trainers and energies simply leave the creature-specific ones unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameplayAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evolve_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub illustrator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_mark: Option<String>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default)]
    pub abilities: Vec<Ability>,
    #[serde(default)]
    pub weaknesses: Vec<TypeModifier>,
    #[serde(default)]
    pub resistances: Vec<TypeModifier>,
    /// Retreat cost as one generic-cost token per unit
    #[serde(default)]
    pub retreat_cost: Vec<String>,
    /// Print finishes the card exists in
    #[serde(default)]
    pub variants: Vec<String>,
}

/// A card in the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Provider identifier (not stable across provider changes)
    pub id: String,
    /// Owning set identifier
    pub set_id: String,
    /// Position within the set (print number, may be alphanumeric)
    pub local_id: String,
    /// Display name
    pub name: String,
    pub category: CardCategory,
    pub rarity: Option<String>,
    pub hp: Option<i64>,
    pub types: Vec<String>,
    /// Evolution stage (creature cards only)
    pub stage: Option<String>,
    pub attributes: GameplayAttributes,
    pub image_small: Option<String>,
    pub image_large: Option<String>,
    pub pricing_cardmarket: Option<PriceVariants>,
    pub pricing_tcgplayer: Option<PriceVariants>,
    /// Last pass that wrote this row (Unix ms)
    pub synced_at: i64,
}

impl Card {
    /// Headline market price, preferring the TCGplayer market value of the
    /// first finish and falling back to the Cardmarket average.
    pub fn headline_price(&self) -> Option<f64> {
        self.tcgplayer_market().or_else(|| self.cardmarket_avg())
    }

    /// First TCGplayer market price across finishes
    pub fn tcgplayer_market(&self) -> Option<f64> {
        self.pricing_tcgplayer
            .as_ref()?
            .values()
            .find_map(|point| point.market)
    }

    /// Cardmarket average of the normal finish, else of any finish
    pub fn cardmarket_avg(&self) -> Option<f64> {
        let variants = self.pricing_cardmarket.as_ref()?;
        variants
            .get("normal")
            .and_then(|point| point.avg)
            .or_else(|| variants.values().find_map(|point| point.avg))
    }
}

/// A card joined with the display fields of its set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardListing {
    pub card: Card,
    pub set_name: String,
    pub series: Option<String>,
}
