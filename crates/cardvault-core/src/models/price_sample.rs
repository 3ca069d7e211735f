//! Price history model

use serde::{Deserialize, Serialize};

use super::Card;

/// One day's price observation for a card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub card_id: String,
    /// UTC day (`YYYY-MM-DD`)
    pub date: String,
    pub cardmarket_avg: Option<f64>,
    pub tcgplayer_market: Option<f64>,
}

impl PriceSample {
    /// Build the sample for `card` on `date`, or `None` when the card carries
    /// no price at all.
    pub fn from_card(card: &Card, date: &str) -> Option<Self> {
        let cardmarket_avg = card.cardmarket_avg();
        let tcgplayer_market = card.tcgplayer_market();
        if cardmarket_avg.is_none() && tcgplayer_market.is_none() {
            return None;
        }
        Some(Self {
            card_id: card.id.clone(),
            date: date.to_string(),
            cardmarket_avg,
            tcgplayer_market,
        })
    }
}
