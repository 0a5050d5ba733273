pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

#[async_trait]
pub trait Fetcher {
    /// Fetch the page body at `url`; non-success statuses are errors.
    async fn fetch(&self, url: &str) -> Result<String>;
}
