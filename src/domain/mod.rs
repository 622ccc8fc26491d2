//! Domain Layer - Core data types for the harvester
//!
//! Pure types with no I/O. All external interactions happen through the ports layer.
//!
//! - `listing`: summary records from the paginated market endpoint
//! - `detail`: per-asset metadata with defaults applied at construction
//! - `coin`: the merged, persisted coin entry
//! - `document`: ordered id -> coin mapping written to disk
//! - `checkpoint`: resume marker

pub mod listing;
pub mod detail;
pub mod coin;
pub mod document;
pub mod checkpoint;

pub use listing::ListingRecord;
pub use detail::{DetailRecord, MarketStats, DEFAULT_DESCRIPTION};
pub use coin::{AggregatedCoin, LivePrice, generate_coin_id};
pub use document::CoinDocument;
pub use checkpoint::Checkpoint;
