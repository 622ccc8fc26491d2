//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - CoinGecko: market listing and coin detail API client
//! - Storage: JSON document and checkpoint files
//! - CLI: Command-line interface handlers

pub mod coingecko;
pub mod storage;
pub mod cli;

pub use coingecko::CoinGeckoClient;
pub use storage::{JsonCheckpointFile, JsonDocumentStore};
pub use cli::CliApp;
