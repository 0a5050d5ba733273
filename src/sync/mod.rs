//! Incremental synchronization of the forum listing.
//!
//! The [`Synchronizer`] owns both stores. Scraping feeds the cache through
//! its change-aware upsert; user actions go to the classification store; the
//! three views in [`views`] are recomputed from both on every request.

pub mod views;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::app::Result;
use crate::domain::Story;
use crate::fetcher::Fetcher;
use crate::parser::PageParser;
use crate::store::{CacheStore, ClassificationStore};

pub use views::{ViewEntry, ViewKind};

/// Options for a multi-page [`Synchronizer::sync`].
#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    /// Upper bound on the number of listing pages to visit
    pub max_pages: Option<u32>,
    /// Stop at the first story the cache already knows
    pub stop_on_duplicate: bool,
    /// Pause between two listing page fetches
    pub page_delay: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            max_pages: None,
            stop_on_duplicate: true,
            page_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub pages_visited: u32,
    pub total_pages: u32,
    /// New or changed stories, in the order they were scraped
    pub updated: Vec<Story>,
}

struct PageScrape {
    stories: Vec<Story>,
    stopped_early: bool,
}

pub struct Synchronizer {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    parser: PageParser,
    base_url: Url,
    page_path: String,
    cache: CacheStore,
    classification: ClassificationStore,
}

impl Synchronizer {
    /// Wire the stores together, seeding the cache with classified stories it
    /// has never seen.
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        parser: PageParser,
        base_url: Url,
        page_path: String,
        mut cache: CacheStore,
        classification: ClassificationStore,
    ) -> Result<Self> {
        cache.seed_from(&classification)?;

        Ok(Self {
            fetcher,
            parser,
            base_url,
            page_path,
            cache,
            classification,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn classification(&self) -> &ClassificationStore {
        &self.classification
    }

    /// URL of a listing page; page 1 is the base URL itself.
    pub fn listing_url(&self, page_index: u32) -> Result<Url> {
        if page_index <= 1 {
            return Ok(self.base_url.clone());
        }
        let path = self.page_path.replace("{page}", &page_index.to_string());
        Ok(self.base_url.join(&path)?)
    }

    /// Scrape one listing page into the cache.
    ///
    /// Stories are returned in page order. With `stop_on_duplicate`, the first
    /// story whose marker the cache already holds ends the page: neither it nor
    /// anything after it is returned.
    pub async fn scrape_listing_page(
        &mut self,
        page_index: u32,
        stop_on_duplicate: bool,
    ) -> Result<Vec<Story>> {
        let body = self.fetch_listing(page_index).await?;
        Ok(self.ingest_listing(&body, stop_on_duplicate)?.stories)
    }

    async fn fetch_listing(&self, page_index: u32) -> Result<String> {
        let url = self.listing_url(page_index)?;
        self.fetcher.fetch(url.as_str()).await
    }

    fn ingest_listing(&mut self, body: &str, stop_on_duplicate: bool) -> Result<PageScrape> {
        let entries = self.parser.parse_listing(body)?;
        let mut stories = Vec::with_capacity(entries.len());

        for entry in entries {
            let story = Story::captured(entry.id, entry.title, Some(entry.update_marker), entry.url);
            let changed = self.cache.upsert(story.clone())?;

            if stop_on_duplicate && !changed {
                tracing::debug!("Story {} unchanged; stopping page early", story.id);
                return Ok(PageScrape {
                    stories,
                    stopped_early: true,
                });
            }
            stories.push(story);
        }

        Ok(PageScrape {
            stories,
            stopped_early: false,
        })
    }

    /// Fetch the first listing page and read the page count from its pager.
    pub async fn page_count(&self) -> Result<u32> {
        let body = self.fetch_listing(1).await?;
        Ok(self.parser.page_count(&body)?)
    }

    /// Walk the listing from page 1 until the last page, `max_pages`, or the
    /// first already known story when `stop_on_duplicate` is set.
    pub async fn sync(&mut self, options: SyncOptions) -> Result<SyncReport> {
        let first = self.fetch_listing(1).await?;
        let total_pages = self.parser.page_count(&first)?;
        let last_page = options
            .max_pages
            .map_or(total_pages, |max| max.min(total_pages));

        let mut report = SyncReport {
            total_pages,
            ..Default::default()
        };

        let mut page = self.ingest_listing(&first, options.stop_on_duplicate)?;
        let mut page_index = 1;

        loop {
            report.pages_visited += 1;
            tracing::info!(
                "Page {}/{}: {} new or updated stories",
                page_index,
                total_pages,
                page.stories.len()
            );
            report.updated.append(&mut page.stories);

            if page.stopped_early || page_index >= last_page {
                break;
            }

            page_index += 1;
            if !options.page_delay.is_zero() {
                tokio::time::sleep(options.page_delay).await;
            }
            let body = self.fetch_listing(page_index).await?;
            page = self.ingest_listing(&body, options.stop_on_duplicate)?;
        }

        Ok(report)
    }

    /// Re-read a story's own page and upsert what it shows.
    ///
    /// Returns `false` without fetching when the id is not cached, and
    /// `false` after fetching when nothing changed.
    pub async fn refresh_detail(&mut self, id: i64) -> Result<bool> {
        let Some(url) = self.cache.get(id).map(|story| story.url.clone()) else {
            return Ok(false);
        };

        let body = self.fetcher.fetch(&url).await?;
        let detail = self.parser.parse_detail(&body)?;

        let story = Story::captured(id, detail.title, Some(detail.update_marker), url);
        self.cache.upsert(story)
    }

    pub fn watch(&mut self, id: i64, reset_marker: bool) -> Result<bool> {
        self.classification.watch(id, &self.cache, reset_marker)
    }

    pub fn ignore(&mut self, id: i64, reset_marker: bool) -> Result<bool> {
        self.classification.ignore(id, &self.cache, reset_marker)
    }

    /// Mark the current cached state of a classified story as seen.
    pub fn acknowledge(&mut self, id: i64) -> Result<bool> {
        let Some(cached) = self.cache.get(id) else {
            return Ok(false);
        };
        let marker = cached.update_marker.clone();
        self.classification.set_update_marker(id, marker)
    }

    pub fn set_update_marker(&mut self, id: i64, update_marker: Option<String>) -> Result<bool> {
        self.classification.set_update_marker(id, update_marker)
    }

    pub fn set_title(&mut self, id: i64, title: String) -> Result<bool> {
        self.classification.set_title(id, title)
    }

    pub fn set_priority(&mut self, id: i64, priority: Option<f64>) -> Result<bool> {
        self.classification.set_priority(id, priority)
    }

    pub fn set_description(&mut self, id: i64, description: Option<String>) -> Result<bool> {
        self.classification.set_description(id, description)
    }

    pub fn view(&self, kind: ViewKind) -> Vec<ViewEntry> {
        views::view(kind, &self.cache, &self.classification)
    }

    pub fn watch_view(&self) -> Vec<ViewEntry> {
        views::watch_view(&self.cache, &self.classification)
    }

    pub fn others_view(&self) -> Vec<ViewEntry> {
        views::others_view(&self.cache, &self.classification)
    }

    pub fn ignore_view(&self) -> Vec<ViewEntry> {
        views::ignore_view(&self.classification)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::app::StorywatchError;
    use crate::parser::{SelectorConfig, StructureError};
    use crate::store::MemoryBackend;

    const BASE: &str = "https://forum.example/";

    /// Serves canned pages and records every requested URL.
    #[derive(Default)]
    struct FakeFetcher {
        pages: Mutex<HashMap<String, String>>,
        requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        fn serve(&self, url: &str, body: String) {
            self.pages.lock().unwrap().insert(url.to_string(), body);
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Fetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| {
                    StorywatchError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, url))
                })
        }
    }

    fn listing(entries: &[(i64, &str, &str)], pages: u32) -> String {
        let mut body = String::from("<html><body>");
        for (id, title, marker) in entries {
            body.push_str(&format!(
                r#"<div class="shortstory">
                    <div class="shortstoryHead"><a href="/tip/{id}-story.html">{title}</a></div>
                    <div class="staticInfoLeftData">{marker}</div>
                </div>"#
            ));
        }
        body.push_str(r#"<div class="block_4">"#);
        for page in 1..=pages {
            body.push_str(&format!(r#"<a href="/page/{page}/">{page}</a> "#));
        }
        body.push_str("</div></body></html>");
        body
    }

    fn synchronizer(fetcher: Arc<FakeFetcher>) -> Synchronizer {
        synchronizer_with(fetcher, CacheStore::in_memory(), ClassificationStore::in_memory())
    }

    fn synchronizer_with(
        fetcher: Arc<FakeFetcher>,
        cache: CacheStore,
        classification: ClassificationStore,
    ) -> Synchronizer {
        let base = Url::parse(BASE).unwrap();
        let parser = PageParser::new(SelectorConfig::default(), base.clone()).unwrap();
        Synchronizer::new(fetcher, parser, base, "page/{page}/".into(), cache, classification)
            .unwrap()
    }

    fn no_delay() -> SyncOptions {
        SyncOptions {
            page_delay: Duration::ZERO,
            ..Default::default()
        }
    }

    #[test]
    fn test_listing_url() {
        let sync = synchronizer(Arc::new(FakeFetcher::default()));
        assert_eq!(sync.listing_url(1).unwrap().as_str(), BASE);
        assert_eq!(
            sync.listing_url(3).unwrap().as_str(),
            "https://forum.example/page/3/"
        );
    }

    #[tokio::test]
    async fn test_first_scrape_fills_cache() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1"), (11, "B", "v1"), (12, "C", "v1")], 1));
        let mut sync = synchronizer(fetcher);

        let stories = sync.scrape_listing_page(1, false).await.unwrap();
        let ids: Vec<i64> = stories.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        assert_eq!(sync.cache().len(), 3);
        assert_eq!(
            sync.cache().get(11).unwrap().url,
            "https://forum.example/tip/11-story.html"
        );
    }

    #[tokio::test]
    async fn test_stop_on_duplicate_all_known_yields_nothing() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1"), (11, "B", "v1")], 1));
        let mut sync = synchronizer(fetcher);

        sync.scrape_listing_page(1, true).await.unwrap();
        let again = sync.scrape_listing_page(1, true).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_stop_on_duplicate_stops_at_first_known() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(11, "B", "v1"), (10, "A", "v1")], 1));
        let mut sync = synchronizer(fetcher.clone());
        sync.scrape_listing_page(1, false).await.unwrap();

        // 12 is new, 11 is unchanged, 10 changed but sits after the duplicate.
        fetcher.serve(
            BASE,
            listing(&[(12, "C", "v1"), (11, "B", "v1"), (10, "A", "v2")], 1),
        );
        let stories = sync.scrape_listing_page(1, true).await.unwrap();
        assert_eq!(stories.iter().map(|s| s.id).collect::<Vec<_>>(), vec![12]);
        assert_eq!(sync.cache().get(10).unwrap().update_marker.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_without_stop_yields_everything() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1"), (11, "B", "v1")], 1));
        let mut sync = synchronizer(fetcher);

        sync.scrape_listing_page(1, false).await.unwrap();
        let again = sync.scrape_listing_page(1, false).await.unwrap();
        assert_eq!(again.len(), 2);
    }

    #[tokio::test]
    async fn test_watched_story_update_shows_in_watch_view() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1"), (11, "B", "v1"), (12, "C", "v1")], 1));
        let mut sync = synchronizer(fetcher.clone());
        sync.scrape_listing_page(1, false).await.unwrap();

        assert!(sync.watch(10, false).unwrap());
        assert!(sync.watch_view().is_empty());

        fetcher.serve(BASE, listing(&[(10, "A, chapter 2", "v2")], 1));
        sync.scrape_listing_page(1, false).await.unwrap();

        let watch = sync.watch_view();
        assert_eq!(watch.len(), 1);
        assert_eq!(watch[0].id, 10);
        assert_eq!(watch[0].title, "A");
        assert_eq!(watch[0].cached_title.as_deref(), Some("A, chapter 2"));
        assert!(sync.others_view().iter().all(|e| e.id != 10));

        // Watching it again takes the new snapshot and clears it from the view.
        assert!(sync.watch(10, false).unwrap());
        assert!(sync.watch_view().is_empty());
        assert_eq!(sync.classification().get(10).unwrap().title, "A, chapter 2");
    }

    #[tokio::test]
    async fn test_ignore_with_reset_marker() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(11, "B", "v1")], 1));
        let mut sync = synchronizer(fetcher);
        sync.scrape_listing_page(1, false).await.unwrap();

        assert!(sync.ignore(11, true).unwrap());
        assert_eq!(sync.classification().get(11).unwrap().update_marker, None);
        assert_eq!(sync.ignore_view().len(), 1);

        // Moving it to the watch list now surfaces it as changed.
        sync.watch(11, false).unwrap();
        assert_eq!(sync.watch_view().len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_clears_watch_view() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1")], 1));
        let mut sync = synchronizer(fetcher);
        sync.scrape_listing_page(1, false).await.unwrap();

        sync.watch(10, true).unwrap();
        assert_eq!(sync.watch_view().len(), 1);

        assert!(sync.acknowledge(10).unwrap());
        assert!(sync.watch_view().is_empty());
        assert!(!sync.acknowledge(99).unwrap());
    }

    #[tokio::test]
    async fn test_refresh_detail() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(10, "A", "v1")], 1));
        fetcher.serve(
            "https://forum.example/tip/10-story.html",
            r#"<html><head><title>A (complete) » Forum</title></head>
<body><div class="staticInfoLeftData">v3</div></body></html>"#
                .into(),
        );
        let mut sync = synchronizer(fetcher);
        sync.scrape_listing_page(1, false).await.unwrap();

        assert!(sync.refresh_detail(10).await.unwrap());
        let cached = sync.cache().get(10).unwrap();
        assert_eq!(cached.title, "A (complete)");
        assert_eq!(cached.update_marker.as_deref(), Some("v3"));
        assert_eq!(cached.url, "https://forum.example/tip/10-story.html");

        assert!(!sync.refresh_detail(10).await.unwrap());
    }

    #[tokio::test]
    async fn test_refresh_unknown_id_does_not_fetch() {
        let fetcher = Arc::new(FakeFetcher::default());
        let mut sync = synchronizer(fetcher.clone());

        assert!(!sync.refresh_detail(42).await.unwrap());
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_structure_error_surfaces() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(
            BASE,
            r#"<div class="shortstory"><div class="staticInfoLeftData">v1</div></div>"#.into(),
        );
        let mut sync = synchronizer(fetcher);

        let err = sync.scrape_listing_page(1, false).await.unwrap_err();
        assert!(matches!(
            err,
            StorywatchError::Structure(StructureError::MissingElement(_))
        ));
        assert!(sync.cache().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let mut sync = synchronizer(Arc::new(FakeFetcher::default()));
        assert!(sync.scrape_listing_page(2, false).await.is_err());
    }

    #[tokio::test]
    async fn test_sync_walks_pages_until_duplicate() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(30, "F", "v1"), (29, "E", "v1")], 3));
        fetcher.serve(
            "https://forum.example/page/2/",
            listing(&[(28, "D", "v1"), (27, "C", "v1")], 3),
        );
        fetcher.serve(
            "https://forum.example/page/3/",
            listing(&[(26, "B", "v1"), (25, "A", "v1")], 3),
        );
        let mut sync = synchronizer(fetcher.clone());

        let report = sync.sync(no_delay()).await.unwrap();
        assert_eq!(report.total_pages, 3);
        assert_eq!(report.pages_visited, 3);
        assert_eq!(report.updated.len(), 6);

        // A new story on page 1; the next one is known, so page 2 is never read.
        fetcher.serve(
            BASE,
            listing(&[(31, "G", "v1"), (30, "F", "v1"), (29, "E", "v1")], 3),
        );
        let before = fetcher.requests().len();
        let report = sync.sync(no_delay()).await.unwrap();
        assert_eq!(report.pages_visited, 1);
        assert_eq!(report.updated.iter().map(|s| s.id).collect::<Vec<_>>(), vec![31]);
        assert_eq!(fetcher.requests().len(), before + 1);
    }

    #[tokio::test]
    async fn test_sync_respects_max_pages() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[(30, "F", "v1")], 5));
        fetcher.serve(
            "https://forum.example/page/2/",
            listing(&[(29, "E", "v1")], 5),
        );
        let mut sync = synchronizer(fetcher);

        let report = sync
            .sync(SyncOptions {
                max_pages: Some(2),
                ..no_delay()
            })
            .await
            .unwrap();
        assert_eq!(report.total_pages, 5);
        assert_eq!(report.pages_visited, 2);
    }

    #[tokio::test]
    async fn test_page_count() {
        let fetcher = Arc::new(FakeFetcher::default());
        fetcher.serve(BASE, listing(&[], 7));
        let sync = synchronizer(fetcher);
        assert_eq!(sync.page_count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_classified_but_uncached_story_is_seeded_as_changed() {
        let mut source = CacheStore::in_memory();
        source
            .upsert(Story::captured(
                50,
                "Old favourite".into(),
                Some("long ago".into()),
                "https://forum.example/tip/50-old.html".into(),
            ))
            .unwrap();
        let classification_backend = MemoryBackend::new();
        let mut classification = ClassificationStore::open(classification_backend.clone()).unwrap();
        classification.watch(50, &source, false).unwrap();

        let cache_backend = MemoryBackend::new();
        let sync = synchronizer_with(
            Arc::new(FakeFetcher::default()),
            CacheStore::open(cache_backend.clone()).unwrap(),
            ClassificationStore::open(classification_backend).unwrap(),
        );

        assert_eq!(sync.cache().get(50).unwrap().update_marker, None);
        assert_eq!(sync.watch_view().len(), 1);
        assert_eq!(cache_backend.writes(), 1);
    }
}
