use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;

use crate::domain::Story;
use crate::store::{CacheStore, ClassificationStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ViewKind {
    /// Watched stories with news since they were last acknowledged
    Watch,
    /// Stories on neither list, newest first
    Others,
    /// Ignored stories, in the order they were ignored
    Ignore,
}

/// One printable entry of a view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub id: i64,
    pub title: String,
    /// Title currently shown by the site, when it is worth comparing.
    pub cached_title: Option<String>,
}

impl fmt::Display for ViewEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n\t{}", self.id, self.title)?;
        if let Some(cached_title) = &self.cached_title {
            write!(f, "\n\t{}", cached_title)?;
        }
        Ok(())
    }
}

impl ViewEntry {
    fn plain(story: &Story) -> Self {
        Self {
            id: story.id,
            title: story.title.clone(),
            cached_title: None,
        }
    }
}

pub fn view(kind: ViewKind, cache: &CacheStore, classification: &ClassificationStore) -> Vec<ViewEntry> {
    match kind {
        ViewKind::Watch => watch_view(cache, classification),
        ViewKind::Others => others_view(cache, classification),
        ViewKind::Ignore => ignore_view(classification),
    }
}

/// Watched stories whose marker no longer matches the cache, highest
/// priority first. Stories without a priority come last.
pub fn watch_view(cache: &CacheStore, classification: &ClassificationStore) -> Vec<ViewEntry> {
    let mut changed: Vec<(&Story, Option<&Story>)> = classification
        .watched()
        .map(|story| (story, cache.get(story.id)))
        .filter(|(story, cached)| {
            cached.is_none_or(|cached| cached.update_marker != story.update_marker)
        })
        .collect();

    changed.sort_by(|(a, _), (b, _)| {
        by_priority_desc(a.priority, b.priority).then_with(|| b.id.cmp(&a.id))
    });

    changed
        .into_iter()
        .map(|(story, cached)| ViewEntry {
            id: story.id,
            title: story.title.clone(),
            cached_title: cached.map(|c| c.title.clone()),
        })
        .collect()
}

fn by_priority_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Cached stories on neither list, most recently captured first.
pub fn others_view(cache: &CacheStore, classification: &ClassificationStore) -> Vec<ViewEntry> {
    let mut others: Vec<&Story> = cache
        .iter()
        .filter(|story| !classification.is_watched(story.id) && !classification.is_ignored(story.id))
        .collect();

    others.sort_by(|a, b| {
        b.update_date
            .cmp(&a.update_date)
            .then_with(|| b.id.cmp(&a.id))
    });

    others.into_iter().map(ViewEntry::plain).collect()
}

/// Ignored stories in the order they were added to the list.
pub fn ignore_view(classification: &ClassificationStore) -> Vec<ViewEntry> {
    classification.ignored().map(ViewEntry::plain).collect()
}
