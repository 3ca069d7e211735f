//! Data models for Cardvault

mod card;
mod card_set;
mod holding;
mod price_sample;
mod sync_run;

pub use card::{
    Ability, Attack, Card, CardCategory, CardListing, GameplayAttributes, PricePoint, PriceVariants,
    TypeModifier, GENERIC_COST,
};
pub use card_set::CardSet;
pub use holding::{Holding, HoldingId};
pub use price_sample::PriceSample;
pub use sync_run::{SyncRun, SyncRunStatus};
