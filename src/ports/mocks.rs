//! Scripted in-memory port implementations for tests
//!
//! `MockMarketData` replays queued responses per page / per coin and records
//! every call. The in-memory stores share a `StoreJournal` so tests can assert
//! the relative order of flushes and checkpoint saves.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::domain::{AggregatedCoin, Checkpoint, CoinDocument, DetailRecord, ListingRecord};
use super::market_data::{ListingQuery, MarketDataError, MarketDataPort};
use super::persistence::{CheckpointStore, CoinStore, PersistError};

/// Recorded call against the mock market data port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketCall {
    Listing { page: u32, per_page: u32 },
    Detail(String),
}

/// Mock market data port with per-page and per-coin scripted responses
#[derive(Debug, Default, Clone)]
pub struct MockMarketData {
    calls: Arc<Mutex<Vec<MarketCall>>>,
    pages: Arc<Mutex<HashMap<u32, VecDeque<Result<Vec<ListingRecord>, MarketDataError>>>>>,
    details: Arc<Mutex<HashMap<String, DetailRecord>>>,
    detail_script: Arc<Mutex<HashMap<String, VecDeque<Result<DetailRecord, MarketDataError>>>>>,
}

impl MockMarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` for `page` (once per queued call; unscripted pages are empty)
    pub fn with_page(self, page: u32, records: Vec<ListingRecord>) -> Self {
        self.with_page_response(page, Ok(records))
    }

    /// Queue a raw response for `page`
    pub fn with_page_response(
        self,
        page: u32,
        response: Result<Vec<ListingRecord>, MarketDataError>,
    ) -> Self {
        self.pages
            .lock()
            .unwrap()
            .entry(page)
            .or_default()
            .push_back(response);
        self
    }

    /// Serve `detail` for every lookup of `coin_id` once its script is drained
    pub fn with_detail(self, coin_id: &str, detail: DetailRecord) -> Self {
        self.details.lock().unwrap().insert(coin_id.to_string(), detail);
        self
    }

    /// Queue responses served, in order, before falling back to `with_detail`
    pub fn with_detail_script(
        self,
        coin_id: &str,
        responses: Vec<Result<DetailRecord, MarketDataError>>,
    ) -> Self {
        self.detail_script
            .lock()
            .unwrap()
            .entry(coin_id.to_string())
            .or_default()
            .extend(responses);
        self
    }

    /// Get all recorded calls
    pub fn get_calls(&self) -> Vec<MarketCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of detail lookups made for `coin_id`
    pub fn detail_calls(&self, coin_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, MarketCall::Detail(id) if id == coin_id))
            .count()
    }
}

#[async_trait]
impl MarketDataPort for MockMarketData {
    async fn fetch_listing_page(
        &self,
        query: &ListingQuery,
    ) -> Result<Vec<ListingRecord>, MarketDataError> {
        self.calls.lock().unwrap().push(MarketCall::Listing {
            page: query.page,
            per_page: query.per_page,
        });
        self.pages
            .lock()
            .unwrap()
            .get_mut(&query.page)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_coin_detail(&self, coin_id: &str) -> Result<DetailRecord, MarketDataError> {
        self.calls
            .lock()
            .unwrap()
            .push(MarketCall::Detail(coin_id.to_string()));

        if let Some(response) = self
            .detail_script
            .lock()
            .unwrap()
            .get_mut(coin_id)
            .and_then(|queue| queue.pop_front())
        {
            return response;
        }

        self.details
            .lock()
            .unwrap()
            .get(coin_id)
            .cloned()
            .ok_or_else(|| MarketDataError::Status(404, format!("coin '{}' not found", coin_id)))
    }

    fn live_price_url(&self, coin_id: &str) -> String {
        format!("https://mock.test/simple/price?ids={}&vs_currencies=usd", coin_id)
    }
}

/// Observable persistence side effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Entry appended, by coin name
    Append(String),
    /// Flush completed with this many entries durable
    Flush(usize),
    SaveCheckpoint(usize),
    ClearCheckpoint,
}

pub type StoreJournal = Arc<Mutex<Vec<StoreEvent>>>;

/// In-memory coin store; `flushed()` is the "on disk" copy
#[derive(Debug, Default)]
pub struct InMemoryCoinStore {
    pending: CoinDocument,
    flushed: Arc<Mutex<CoinDocument>>,
    journal: StoreJournal,
}

impl InMemoryCoinStore {
    pub fn new(journal: StoreJournal) -> Self {
        Self {
            journal,
            ..Default::default()
        }
    }

    /// Start from an already persisted document
    pub fn with_document(journal: StoreJournal, document: CoinDocument) -> Self {
        Self {
            pending: document.clone(),
            flushed: Arc::new(Mutex::new(document)),
            journal,
        }
    }

    /// Snapshot of what the last flush made durable
    pub fn flushed(&self) -> CoinDocument {
        self.flushed.lock().unwrap().clone()
    }
}

impl CoinStore for InMemoryCoinStore {
    fn append(&mut self, id: String, coin: AggregatedCoin) -> Result<(), PersistError> {
        self.journal
            .lock()
            .unwrap()
            .push(StoreEvent::Append(coin.name.clone()));
        self.pending.push(id, coin);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), PersistError> {
        *self.flushed.lock().unwrap() = self.pending.clone();
        self.journal
            .lock()
            .unwrap()
            .push(StoreEvent::Flush(self.pending.len()));
        Ok(())
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

/// In-memory checkpoint store
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    checkpoint: Option<Checkpoint>,
    journal: StoreJournal,
}

impl InMemoryCheckpointStore {
    pub fn new(journal: StoreJournal) -> Self {
        Self {
            checkpoint: None,
            journal,
        }
    }

    pub fn with_checkpoint(journal: StoreJournal, checkpoint: Checkpoint) -> Self {
        Self {
            checkpoint: Some(checkpoint),
            journal,
        }
    }

    pub fn current(&self) -> Option<Checkpoint> {
        self.checkpoint
    }
}

impl CheckpointStore for InMemoryCheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>, PersistError> {
        Ok(self.checkpoint)
    }

    fn save(&mut self, checkpoint: Checkpoint) -> Result<(), PersistError> {
        self.journal
            .lock()
            .unwrap()
            .push(StoreEvent::SaveCheckpoint(checkpoint.last_processed_index));
        self.checkpoint = Some(checkpoint);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), PersistError> {
        self.journal.lock().unwrap().push(StoreEvent::ClearCheckpoint);
        self.checkpoint = None;
        Ok(())
    }
}
