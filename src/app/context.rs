use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::app::error::Result;
use crate::config::Config;
use crate::fetcher::{Fetcher, HttpFetcher};
use crate::parser::PageParser;
use crate::store::{CacheStore, ClassificationStore, JsonFile};
use crate::sync::{SyncOptions, Synchronizer};

pub struct AppContext {
    pub config: Config,
    pub sync: Synchronizer,
}

impl AppContext {
    /// Open both stores from the configured data directory.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.fetch)?);

        let cache = CacheStore::open(JsonFile::new(config.storage.cache_path()?))?;
        let classification =
            ClassificationStore::open(JsonFile::new(config.storage.classification_path()?))?;

        Self::with_stores(config, fetcher, cache, classification)
    }

    /// Context backed by in-memory stores; nothing touches the disk.
    pub fn in_memory(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        Self::with_stores(
            config,
            fetcher,
            CacheStore::in_memory(),
            ClassificationStore::in_memory(),
        )
    }

    fn with_stores(
        config: Config,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        cache: CacheStore,
        classification: ClassificationStore,
    ) -> Result<Self> {
        let base_url = Url::parse(&config.source.base_url)?;
        let parser = PageParser::new(config.selectors.clone(), base_url.clone())?;

        let sync = Synchronizer::new(
            fetcher,
            parser,
            base_url,
            config.source.page_path.clone(),
            cache,
            classification,
        )?;

        Ok(Self { config, sync })
    }

    pub fn sync_options(&self, max_pages: Option<u32>, stop_on_duplicate: bool) -> SyncOptions {
        SyncOptions {
            max_pages,
            stop_on_duplicate,
            page_delay: Duration::from_millis(self.config.fetch.page_delay_ms),
        }
    }
}
