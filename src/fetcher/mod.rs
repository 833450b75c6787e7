pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::{HttpFetcher, DEFAULT_FETCH_TIMEOUT};

#[derive(Debug)]
pub enum FetchResult {
    /// Body of a 2xx response
    Content { body: Vec<u8> },
    /// Non-2xx response; the feed contributes nothing this cycle
    Skipped { status: u16 },
}

/// Retrieves raw feed documents. Network failures surface as errors,
/// unsuccessful HTTP statuses do not.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult>;
}
