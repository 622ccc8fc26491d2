//! Ports Layer - Trait definitions for external dependencies
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Market data (paginated listing, per-coin details)
//! - Persistence (coin document, resume checkpoint)

pub mod market_data;
pub mod persistence;
pub mod mocks;

pub use market_data::{ListingOrder, ListingQuery, MarketDataError, MarketDataPort};
pub use persistence::{CheckpointStore, CoinStore, PersistError};
