use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::parser::StructureError;

/// One forum listing entry as observed at `update_date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    #[serde(alias = "id_")]
    pub id: i64,
    pub title: String,
    pub update_date: DateTime<Utc>,
    pub update_marker: Option<String>,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the story was first put on the watch or ignore list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<DateTime<Utc>>,
}

impl Story {
    /// A freshly scraped record stamped with the current time.
    pub fn captured(id: i64, title: String, update_marker: Option<String>, url: String) -> Self {
        Self {
            id,
            title,
            update_date: Utc::now(),
            update_marker,
            url,
            priority: None,
            description: None,
            added_at: None,
        }
    }

    /// Copy of the record with user annotations removed, as the cache keeps it.
    pub fn without_annotations(&self) -> Self {
        Self {
            priority: None,
            description: None,
            added_at: None,
            ..self.clone()
        }
    }

    /// Extract the numeric story id from a detail link.
    ///
    /// The last path segment looks like `3158-some-title.html`; the id is the
    /// part before the first hyphen.
    pub fn id_from_url(url: &str) -> Result<i64, StructureError> {
        let segment = url.rsplit('/').next().unwrap_or_default();
        let prefix = segment.split('-').next().unwrap_or_default();
        prefix
            .parse::<i64>()
            .map_err(|_| StructureError::InvalidStoryId(url.to_string()))
    }
}
