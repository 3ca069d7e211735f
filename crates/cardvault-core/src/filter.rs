//! In-memory card filtering for full-catalog queries and smart collections.
//!
//! Every criterion is optional and criteria combine with AND. An absent
//! criterion (or an empty value/list) places no constraint. A criterion whose
//! data a record type does not expose at all is passed through: plain
//! [`Card`]s carry no series, so `series` only narrows [`CardListing`]s, and
//! `stage` only narrows records that report a stage (creature cards). A
//! listing whose set has no series fails any `series` criterion.

use serde::{Deserialize, Serialize};

use crate::models::{Card, CardCategory, CardListing};

/// Declarative filter. All text comparisons are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Exact set identifier
    #[serde(default)]
    pub set_id: Option<String>,
    /// Name of the series the card's set belongs to
    #[serde(default)]
    pub series: Option<String>,
    /// Substring the card name must contain
    #[serde(default)]
    pub name: Option<String>,
    /// Card name must contain at least one of these (so "Bulbasaur" also
    /// matches "Erika's Bulbasaur")
    #[serde(default)]
    pub names: Option<Vec<String>>,
    /// Rarity must contain at least one of these labels
    #[serde(default)]
    pub rarities: Option<Vec<String>>,
    /// Exact category (`Pokemon`, `Trainer`, `Energy`)
    #[serde(default)]
    pub category: Option<String>,
    /// Exact evolution stage (`Basic`, `Stage1`, ...)
    #[serde(default)]
    pub stage: Option<String>,
}

impl FilterCriteria {
    /// True when no criterion constrains anything
    pub fn is_unconstrained(&self) -> bool {
        text(self.set_id.as_ref()).is_none()
            && text(self.series.as_ref()).is_none()
            && text(self.name.as_ref()).is_none()
            && terms(self.names.as_ref()).is_empty()
            && terms(self.rarities.as_ref()).is_empty()
            && text(self.category.as_ref()).is_none()
            && text(self.stage.as_ref()).is_none()
    }

    /// Check one record against every criterion
    pub fn matches<T: Filterable + ?Sized>(&self, record: &T) -> bool {
        if let Some(set_id) = text(self.set_id.as_ref()) {
            if !record.set_id().eq_ignore_ascii_case(set_id) {
                return false;
            }
        }

        if let Some(series) = text(self.series.as_ref()).filter(|_| record.has_series()) {
            let matched = record
                .series()
                .is_some_and(|record_series| record_series.trim().eq_ignore_ascii_case(series));
            if !matched {
                return false;
            }
        }

        let name = record.name().to_lowercase();
        if let Some(needle) = text(self.name.as_ref()) {
            if !name.contains(&needle.to_lowercase()) {
                return false;
            }
        }

        let names = terms(self.names.as_ref());
        if !names.is_empty() && !names.iter().any(|needle| name.contains(needle.as_str())) {
            return false;
        }

        let rarities = terms(self.rarities.as_ref());
        if !rarities.is_empty() {
            let Some(rarity) = record.rarity().map(str::to_lowercase) else {
                return false;
            };
            if !rarities.iter().any(|label| rarity.contains(label.as_str())) {
                return false;
            }
        }

        if let Some(category) = text(self.category.as_ref()) {
            if !record.category().matches_label(category) {
                return false;
            }
        }

        if let (Some(stage), Some(record_stage)) = (text(self.stage.as_ref()), record.stage()) {
            if !record_stage.trim().eq_ignore_ascii_case(stage) {
                return false;
            }
        }

        true
    }
}

/// Record shape the filter can inspect
pub trait Filterable {
    fn set_id(&self) -> &str;
    fn name(&self) -> &str;
    fn rarity(&self) -> Option<&str>;
    fn category(&self) -> &CardCategory;

    /// Whether the record type carries its set's series at all
    fn has_series(&self) -> bool {
        false
    }

    /// Series of the record's set
    fn series(&self) -> Option<&str> {
        None
    }

    /// Evolution stage; `None` when the record does not expose one
    fn stage(&self) -> Option<&str> {
        None
    }
}

impl Filterable for Card {
    fn set_id(&self) -> &str {
        &self.set_id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rarity(&self) -> Option<&str> {
        self.rarity.as_deref()
    }

    fn category(&self) -> &CardCategory {
        &self.category
    }

    fn stage(&self) -> Option<&str> {
        self.stage.as_deref()
    }
}

impl Filterable for CardListing {
    fn set_id(&self) -> &str {
        &self.card.set_id
    }

    fn name(&self) -> &str {
        &self.card.name
    }

    fn rarity(&self) -> Option<&str> {
        self.card.rarity.as_deref()
    }

    fn category(&self) -> &CardCategory {
        &self.card.category
    }

    fn has_series(&self) -> bool {
        true
    }

    fn series(&self) -> Option<&str> {
        self.series.as_deref()
    }

    fn stage(&self) -> Option<&str> {
        self.card.stage.as_deref()
    }
}

/// Select the records matching `criteria`, preserving input order.
pub fn filter_cards<'a, T: Filterable>(records: &'a [T], criteria: &FilterCriteria) -> Vec<&'a T> {
    if criteria.is_unconstrained() {
        return records.iter().collect();
    }
    records
        .iter()
        .filter(|record| criteria.matches(*record))
        .collect()
}

fn text(value: Option<&String>) -> Option<&str> {
    value.map(|value| value.trim()).filter(|value| !value.is_empty())
}

fn terms(values: Option<&Vec<String>>) -> Vec<String> {
    values
        .map(|values| {
            values
                .iter()
                .map(|value| value.trim().to_lowercase())
                .filter(|value| !value.is_empty())
                .collect()
        })
        .unwrap_or_default()
}
