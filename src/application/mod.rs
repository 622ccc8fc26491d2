pub mod retry;
pub mod listing_fetcher;
pub mod detail_fetcher;
pub mod pipeline;

pub use retry::{RetryDisposition, RetryError, RetryPolicy, DETAIL_RETRY, LISTING_RETRY};
pub use listing_fetcher::{ListingFetcher, PaginationSettings};
pub use detail_fetcher::{DetailFetcher, DetailOutcome};
pub use pipeline::{HarvestSettings, IngestPipeline, PipelineError, RunSummary, COIN_PAUSE};
