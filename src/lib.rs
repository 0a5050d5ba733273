//! # storywatch
//!
//! Keeps track of new and updated stories on a paginated forum listing.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Parser → Synchronizer → CacheStore
//!                         │
//!                         └── ClassificationStore → views
//! ```
//!
//! - [`fetcher`]: HTTP client for listing and story pages
//! - [`parser`]: CSS-selector extraction of stories, titles, page counts
//! - [`store`]: JSON-file persistence of the cache and the watch/ignore lists
//! - [`sync`]: scraping, reconciliation, and the watch/others/ignore views
//!
//! ## Quick Start
//!
//! ```bash
//! # Pick up everything new since the last run
//! storywatch sync
//!
//! # Review unclassified stories and file them
//! storywatch show others
//! storywatch watch 3158
//! storywatch ignore 3160
//!
//! # Later: which watched stories moved?
//! storywatch sync
//! storywatch show watch
//! storywatch ack 3158
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together configuration,
/// fetcher, parser and both stores.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/storywatch/config.toml`, supporting:
/// - Source URL and listing page layout
/// - CSS selectors for the forum markup
/// - Fetch timeout, user agent and page delay
/// - Store file locations
pub mod config;

/// Core domain model: [`Story`](domain::Story).
pub mod domain;

/// HTTP fetching.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for page fetching
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Listing and story page extraction.
pub mod parser;

/// Persistent stores.
///
/// - [`CacheStore`](store::CacheStore): last seen state of every story
/// - [`ClassificationStore`](store::ClassificationStore): watch and ignore lists
/// - [`Backend`](store::Backend): whole-document persistence
pub mod store;

/// Synchronization core and views.
pub mod sync;
