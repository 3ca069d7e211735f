pub mod cards;
pub mod common;
pub mod holdings;
pub mod runs;
pub mod sync;
