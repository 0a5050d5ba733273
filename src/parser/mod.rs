//! Extraction of story records from forum markup.
//!
//! The forum renders a paginated index of stories; each entry carries a link
//! to the story page and a short "last updated" blurb that we treat as an
//! opaque change marker.
//!
//! ```text
//! listing page ─┬─ parse_listing → [ListingEntry]
//!               └─ page_count    → u32
//! detail page  ──── parse_detail → DetailEntry
//! ```
//!
//! Every extractor returns a [`StructureError`] naming the element it could
//! not find, so markup drift on the site surfaces as a readable error instead
//! of an empty result.

mod config;
mod extractor;

pub use config::SelectorConfig;
pub use extractor::PageParser;

use thiserror::Error;

/// A story entry as rendered on one listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub id: i64,
    /// Link text with surrounding whitespace trimmed
    pub title: String,
    pub update_marker: String,
    pub url: String,
}

/// Freshest title and marker taken from a story's own page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry {
    pub title: String,
    pub update_marker: String,
}

/// The page does not have the shape the selectors expect.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("missing element matching `{0}`")]
    MissingElement(String),

    #[error("element `{element}` has no `{attribute}` attribute")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    #[error("cannot extract story id from `{0}`")]
    InvalidStoryId(String),

    #[error("cannot resolve story link `{0}`")]
    InvalidLink(String),

    #[error("invalid page count `{0}`")]
    InvalidPageCount(String),

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
}
