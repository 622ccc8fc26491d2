//! gecko-harvest - Resumable CoinGecko Harvester Library
//!
//! Pulls the top coins by market cap from CoinGecko, enriches each with its
//! detail record, and persists the merged result as one JSON document with a
//! resume checkpoint.
//!
//! # Modules
//!
//! - `domain`: Core data types (ListingRecord, DetailRecord, AggregatedCoin, Checkpoint)
//! - `ports`: Trait abstractions (MarketDataPort, CoinStore, CheckpointStore)
//! - `adapters`: External implementations (CoinGecko, JSON files, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Retry policy, fetchers and the ingest pipeline

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
