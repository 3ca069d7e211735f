//! Collection holding model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for a holding, using UUID v7 (time-sortable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HoldingId(Uuid);

impl HoldingId {
    /// Create a new unique holding ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the string representation of this ID
    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for HoldingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HoldingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for HoldingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A user's owned quantity of one card in one print finish
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier
    pub id: HoldingId,
    /// Referenced catalog card
    pub card_id: String,
    pub quantity: i64,
    /// Print finish (`normal`, `holo`, `reverse`, ...)
    pub variant: String,
    pub notes: Option<String>,
    /// Creation timestamp (Unix ms)
    pub created_at: i64,
    /// Last update timestamp (Unix ms)
    pub updated_at: i64,
}

impl Holding {
    /// Create a new holding of `quantity` copies of `card_id`
    #[must_use]
    pub fn new(card_id: impl Into<String>, quantity: i64, variant: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: HoldingId::new(),
            card_id: card_id.into(),
            quantity,
            variant: variant.into(),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach free-form notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_holding_id_unique() {
        let id1 = HoldingId::new();
        let id2 = HoldingId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_holding_id_parse() {
        let id = HoldingId::new();
        let parsed: HoldingId = id.as_str().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_holding_new() {
        let holding = Holding::new("base1-4", 2, "holo").with_notes("PSA 9");
        assert_eq!(holding.card_id, "base1-4");
        assert_eq!(holding.quantity, 2);
        assert_eq!(holding.notes.as_deref(), Some("PSA 9"));
        assert_eq!(holding.created_at, holding.updated_at);
    }
}
