//! Ingest Pipeline
//!
//! Fetches the full listing, then walks it from the resume index one coin at
//! a time:
//!
//! ```text
//! Idle -> FetchingDetail(i) -> Merging(i) -> Persisting(i) -> Throttling(i)
//!      -> FetchingDetail(i + 1) | Done
//! ```
//!
//! Persisting appends to the coin store and, every `flush_every` coins,
//! flushes it and only then saves the checkpoint. The checkpoint on disk is
//! therefore never ahead of the document on disk; a crash redoes at most the
//! coins appended since the last flush.

use std::time::Duration;
use chrono::Utc;
use thiserror::Error;

use crate::domain::{generate_coin_id, AggregatedCoin, Checkpoint, DetailRecord, ListingRecord};
use crate::ports::{CheckpointStore, CoinStore, MarketDataError, MarketDataPort, PersistError};
use super::detail_fetcher::DetailFetcher;
use super::listing_fetcher::{ListingFetcher, PaginationSettings};
use super::retry::{RetryError, RetryPolicy, DETAIL_RETRY, LISTING_RETRY};

/// Pause after each coin (detail endpoint allows ~30 calls/minute on the free tier)
pub const COIN_PAUSE: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Listing fetch failed: {0}")]
    Listing(RetryError<MarketDataError>),

    #[error("Persistence failed: {0}")]
    Persist(#[from] PersistError),
}

/// Runtime parameters for one ingestion run
#[derive(Debug, Clone, PartialEq)]
pub struct HarvestSettings {
    pub pagination: PaginationSettings,
    pub coin_pause: Duration,
    pub listing_retry: RetryPolicy,
    pub detail_retry: RetryPolicy,
    /// Coins appended between flushes (1 = flush after every coin)
    pub flush_every: usize,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            pagination: PaginationSettings {
                vs_currency: "usd".to_string(),
                per_page: 150,
                max_pages: 1,
                page_pause: Duration::from_secs(30),
            },
            coin_pause: COIN_PAUSE,
            listing_retry: LISTING_RETRY,
            detail_retry: DETAIL_RETRY,
            flush_every: 1,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records returned by the listing
    pub listed: usize,
    /// First index processed in this run
    pub resumed_from: usize,
    /// Coins processed in this run
    pub processed: usize,
    /// Coins whose detail lookup fell back to defaults
    pub degraded: usize,
    /// Entries in the document after the final flush
    pub document_len: usize,
    /// Checkpoint on disk after the run, if any
    pub last_checkpoint: Option<usize>,
}

enum Stage {
    Idle,
    FetchingDetail(usize),
    Merging(usize, DetailRecord),
    Persisting(usize, String, AggregatedCoin),
    Throttling(usize),
    Done,
}

pub struct IngestPipeline<M, S, C>
where
    M: MarketDataPort,
    S: CoinStore,
    C: CheckpointStore,
{
    market: M,
    coins: S,
    checkpoints: C,
    settings: HarvestSettings,
    /// Last index appended but not yet covered by a flush + checkpoint
    unflushed: Option<usize>,
    pending_since_flush: usize,
}

impl<M, S, C> IngestPipeline<M, S, C>
where
    M: MarketDataPort,
    S: CoinStore,
    C: CheckpointStore,
{
    pub fn new(market: M, coins: S, checkpoints: C, settings: HarvestSettings) -> Self {
        Self {
            market,
            coins,
            checkpoints,
            settings,
            unflushed: None,
            pending_since_flush: 0,
        }
    }

    /// Give back the ports (e.g. to inspect stores after a run)
    pub fn into_parts(self) -> (M, S, C) {
        (self.market, self.coins, self.checkpoints)
    }

    /// Run the full ingestion once
    pub async fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let listing = ListingFetcher::new(
            &self.market,
            &self.settings.pagination,
            self.settings.listing_retry,
        )
        .fetch_all()
        .await
        .map_err(PipelineError::Listing)?;

        tracing::info!("Processing {} coins...", listing.len());

        let checkpoint = self.checkpoints.load()?;
        let resume_index = Checkpoint::resume_index(checkpoint);
        if checkpoint.is_some() {
            tracing::info!("Resuming from index {}", resume_index);
        }

        let mut summary = RunSummary {
            listed: listing.len(),
            resumed_from: resume_index,
            last_checkpoint: checkpoint.map(|c| c.last_processed_index),
            ..Default::default()
        };

        let mut stage = Stage::Idle;
        loop {
            stage = match stage {
                Stage::Idle => {
                    if resume_index < listing.len() {
                        Stage::FetchingDetail(resume_index)
                    } else {
                        Stage::Done
                    }
                }
                Stage::FetchingDetail(i) => {
                    let coin = &listing[i];
                    tracing::info!(
                        "Fetching details for {} ({}/{})...",
                        coin.name,
                        i + 1,
                        listing.len()
                    );
                    let outcome = DetailFetcher::new(&self.market, self.settings.detail_retry)
                        .fetch(&coin.id)
                        .await;
                    if outcome.is_fallback() {
                        summary.degraded += 1;
                    }
                    Stage::Merging(i, outcome.into_detail())
                }
                Stage::Merging(i, detail) => {
                    let (id, coin) = self.merge(&listing[i], detail);
                    Stage::Persisting(i, id, coin)
                }
                Stage::Persisting(i, id, coin) => {
                    self.persist(i, id, coin, &mut summary)?;
                    summary.processed += 1;
                    Stage::Throttling(i)
                }
                Stage::Throttling(i) => {
                    tokio::time::sleep(self.settings.coin_pause).await;
                    if i + 1 < listing.len() {
                        Stage::FetchingDetail(i + 1)
                    } else {
                        Stage::Done
                    }
                }
                Stage::Done => break,
            };
        }

        self.flush(&mut summary)?;
        summary.document_len = self.coins.len();

        tracing::info!(
            "Coin data for {} coins saved ({} processed this run, {} without details)",
            summary.document_len,
            summary.processed,
            summary.degraded
        );

        Ok(summary)
    }

    fn merge(&self, listing: &ListingRecord, detail: DetailRecord) -> (String, AggregatedCoin) {
        let url = self.market.live_price_url(&listing.id);
        let coin = AggregatedCoin::merge(listing, detail, url, Utc::now());
        (generate_coin_id(), coin)
    }

    fn persist(
        &mut self,
        index: usize,
        id: String,
        coin: AggregatedCoin,
        summary: &mut RunSummary,
    ) -> Result<(), PipelineError> {
        self.coins.append(id, coin)?;
        self.unflushed = Some(index);
        self.pending_since_flush += 1;

        if self.pending_since_flush >= self.settings.flush_every.max(1) {
            self.flush(summary)?;
        }
        Ok(())
    }

    /// Flush the document, then record the last flushed index
    fn flush(&mut self, summary: &mut RunSummary) -> Result<(), PipelineError> {
        self.coins.flush()?;
        tracing::debug!("Flushed {} coins", self.coins.len());

        if let Some(index) = self.unflushed.take() {
            self.checkpoints.save(Checkpoint::new(index))?;
            summary.last_checkpoint = Some(index);
        }
        self.pending_since_flush = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CoinDocument;
    use crate::ports::mocks::{
        InMemoryCheckpointStore, InMemoryCoinStore, MockMarketData, StoreEvent, StoreJournal,
    };
    use mockall::{mock, Sequence};

    fn settings(flush_every: usize) -> HarvestSettings {
        HarvestSettings {
            pagination: PaginationSettings {
                vs_currency: "usd".to_string(),
                per_page: 150,
                max_pages: 1,
                page_pause: Duration::from_secs(30),
            },
            flush_every,
            ..Default::default()
        }
    }

    fn listing(n: usize) -> Vec<ListingRecord> {
        (0..n)
            .map(|i| ListingRecord::new(format!("coin-{i}"), format!("Coin {i}"), format!("c{i}")))
            .collect()
    }

    fn market_with(n: usize) -> MockMarketData {
        let mut mock = MockMarketData::new().with_page(1, listing(n));
        for i in 0..n {
            mock = mock.with_detail(
                &format!("coin-{i}"),
                DetailRecord {
                    market_cap_rank: i as u32 + 1,
                    ..Default::default()
                },
            );
        }
        mock
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_follows_each_flush() {
        let journal = StoreJournal::default();
        let mut pipeline = IngestPipeline::new(
            market_with(2),
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::new(journal.clone()),
            settings(1),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.last_checkpoint, Some(1));
        assert_eq!(
            *journal.lock().unwrap(),
            vec![
                StoreEvent::Append("Coin 0".into()),
                StoreEvent::Flush(1),
                StoreEvent::SaveCheckpoint(0),
                StoreEvent::Append("Coin 1".into()),
                StoreEvent::Flush(2),
                StoreEvent::SaveCheckpoint(1),
                StoreEvent::Flush(2),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_buffered_flush_batches_checkpoints() {
        let journal = StoreJournal::default();
        let mut pipeline = IngestPipeline::new(
            market_with(5),
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::new(journal.clone()),
            settings(2),
        );

        let summary = pipeline.run().await.unwrap();
        let (_, coins, checkpoints) = pipeline.into_parts();

        assert_eq!(summary.document_len, 5);
        assert_eq!(coins.flushed().len(), 5);
        assert_eq!(checkpoints.current(), Some(Checkpoint::new(4)));

        let saves: Vec<_> = journal
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                StoreEvent::SaveCheckpoint(i) => Some(*i),
                _ => None,
            })
            .collect();
        assert_eq!(saves, vec![1, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_skips_processed_indices() {
        let journal = StoreJournal::default();
        let market = market_with(4);
        let mut pipeline = IngestPipeline::new(
            market.clone(),
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::with_checkpoint(journal.clone(), Checkpoint::new(1)),
            settings(1),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.resumed_from, 2);
        assert_eq!(summary.processed, 2);
        assert_eq!(market.detail_calls("coin-0"), 0);
        assert_eq!(market.detail_calls("coin-1"), 0);
        assert_eq!(market.detail_calls("coin-2"), 1);
        assert_eq!(market.detail_calls("coin-3"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_checkpoint_past_end_processes_nothing() {
        let journal = StoreJournal::default();
        let market = market_with(2);
        let mut pipeline = IngestPipeline::new(
            market.clone(),
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::with_checkpoint(journal.clone(), Checkpoint::new(1)),
            settings(1),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.last_checkpoint, Some(1));
        assert_eq!(market.detail_calls("coin-0") + market.detail_calls("coin-1"), 0);
        assert_eq!(*journal.lock().unwrap(), vec![StoreEvent::Flush(0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_detail_still_produces_entry() {
        let journal = StoreJournal::default();
        let market = MockMarketData::new().with_page(1, listing(1));
        let mut pipeline = IngestPipeline::new(
            market,
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::new(journal.clone()),
            settings(1),
        );

        let summary = pipeline.run().await.unwrap();
        let (_, coins, _) = pipeline.into_parts();
        let document: CoinDocument = coins.flushed();
        let (_, coin) = document.iter().next().unwrap();

        assert_eq!(summary.degraded, 1);
        assert_eq!(coin.name, "Coin 0");
        assert_eq!(coin.description, crate::domain::DEFAULT_DESCRIPTION);
        assert_eq!(coin.price, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_detail_response_is_not_degraded() {
        let journal = StoreJournal::default();
        let market = MockMarketData::new()
            .with_page(1, listing(1))
            .with_detail("coin-0", DetailRecord::default());
        let mut pipeline = IngestPipeline::new(
            market,
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::new(journal.clone()),
            settings(1),
        );

        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.degraded, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_listing_failure_persists_nothing() {
        let journal = StoreJournal::default();
        let market = MockMarketData::new()
            .with_page_response(1, Err(MarketDataError::Http("connection refused".into())));
        let mut pipeline = IngestPipeline::new(
            market,
            InMemoryCoinStore::new(journal.clone()),
            InMemoryCheckpointStore::new(journal.clone()),
            settings(1),
        );

        let result = pipeline.run().await;

        assert!(matches!(result, Err(PipelineError::Listing(RetryError::Aborted(_)))));
        assert!(journal.lock().unwrap().is_empty());
    }

    mock! {
        Coins {}
        impl CoinStore for Coins {
            fn append(&mut self, id: String, coin: AggregatedCoin) -> Result<(), PersistError>;
            fn flush(&mut self) -> Result<(), PersistError>;
            fn len(&self) -> usize;
        }
    }

    mock! {
        Checkpoints {}
        impl CheckpointStore for Checkpoints {
            fn load(&self) -> Result<Option<Checkpoint>, PersistError>;
            fn save(&mut self, checkpoint: Checkpoint) -> Result<(), PersistError>;
            fn clear(&mut self) -> Result<(), PersistError>;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_flush_never_saves_checkpoint() {
        let mut coins = MockCoins::new();
        let mut checkpoints = MockCheckpoints::new();
        let mut seq = Sequence::new();

        checkpoints.expect_load().times(1).returning(|| Ok(None));
        coins
            .expect_append()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        coins.expect_flush().times(1).in_sequence(&mut seq).returning(|| {
            Err(PersistError::Serialize("disk full".to_string()))
        });
        coins.expect_len().returning(|| 1);
        checkpoints.expect_save().never();

        let mut pipeline = IngestPipeline::new(market_with(1), coins, checkpoints, settings(1));
        let result = pipeline.run().await;

        assert!(matches!(result, Err(PipelineError::Persist(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_happens_after_flush() {
        let mut coins = MockCoins::new();
        let mut checkpoints = MockCheckpoints::new();
        let mut seq = Sequence::new();

        checkpoints.expect_load().returning(|| Ok(None));
        coins
            .expect_append()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        coins.expect_flush().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        checkpoints
            .expect_save()
            .withf(|c| c.last_processed_index == 0)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        coins.expect_flush().times(1).in_sequence(&mut seq).returning(|| Ok(()));
        coins.expect_len().returning(|| 1);

        let mut pipeline = IngestPipeline::new(market_with(1), coins, checkpoints, settings(1));
        let summary = pipeline.run().await.unwrap();

        assert_eq!(summary.last_checkpoint, Some(0));
    }
}
