use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::Story;
use crate::store::{Backend, CacheStore, MemoryBackend};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ClassificationDocument {
    #[serde(default)]
    items: Vec<Story>,
    #[serde(default)]
    ignored_items: Vec<Story>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Watched,
    Ignored,
}

/// The user's watch and ignore lists.
///
/// An id is never present in both lists; moving a story into one list takes
/// it out of the other. Entries are snapshots and can lag behind the cache.
/// Each list keeps the order stories were added in, and is written back in
/// that order.
pub struct ClassificationStore {
    watched: Vec<Story>,
    ignored: Vec<Story>,
    backend: Box<dyn Backend + Send>,
}

impl ClassificationStore {
    pub fn open<B: Backend + Send + 'static>(backend: B) -> Result<Self> {
        let document = match backend.read()? {
            Some(bytes) => serde_json::from_slice::<ClassificationDocument>(&bytes)?,
            None => ClassificationDocument::default(),
        };

        let mut watched: Vec<Story> = Vec::with_capacity(document.items.len());
        for story in document.items {
            if position(&watched, story.id).is_some() {
                tracing::warn!("Story {} is watched twice; keeping the first entry", story.id);
                continue;
            }
            watched.push(story);
        }

        let mut ignored: Vec<Story> = Vec::with_capacity(document.ignored_items.len());
        for story in document.ignored_items {
            if position(&watched, story.id).is_some() {
                tracing::warn!("Story {} is both watched and ignored; keeping it watched", story.id);
                continue;
            }
            if position(&ignored, story.id).is_some() {
                tracing::warn!("Story {} is ignored twice; keeping the first entry", story.id);
                continue;
            }
            ignored.push(story);
        }

        tracing::debug!(
            "Loaded {} watched and {} ignored stories",
            watched.len(),
            ignored.len()
        );

        Ok(Self {
            watched,
            ignored,
            backend: Box::new(backend),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            watched: Vec::new(),
            ignored: Vec::new(),
            backend: Box::new(MemoryBackend::new()),
        }
    }

    /// Put `id` on the watch list.
    ///
    /// The entry is taken from the ignore list when present there, otherwise
    /// copied fresh from the cache, which also refreshes a story that is
    /// already watched. With `reset_marker` its marker is cleared so it reads
    /// as changed until the next real update. Returns `false` when the id is
    /// unknown to both.
    pub fn watch(&mut self, id: i64, cache: &CacheStore, reset_marker: bool) -> Result<bool> {
        self.classify(id, List::Watched, cache, reset_marker)
    }

    /// Put `id` on the ignore list; the mirror image of [`watch`](Self::watch).
    pub fn ignore(&mut self, id: i64, cache: &CacheStore, reset_marker: bool) -> Result<bool> {
        self.classify(id, List::Ignored, cache, reset_marker)
    }

    fn classify(
        &mut self,
        id: i64,
        target: List,
        cache: &CacheStore,
        reset_marker: bool,
    ) -> Result<bool> {
        let (dest, source) = match target {
            List::Watched => (&mut self.watched, &mut self.ignored),
            List::Ignored => (&mut self.ignored, &mut self.watched),
        };

        // A refreshed entry keeps the time it was first classified.
        let first_added = position(dest, id).and_then(|index| dest[index].added_at);

        let story = match position(source, id) {
            Some(index) => Some(source.remove(index)),
            None => cache.get(id).map(|cached| Story {
                added_at: first_added,
                ..cached.without_annotations()
            }),
        };

        let Some(mut story) = story else {
            tracing::debug!("Story {} is not known; nothing to classify", id);
            return Ok(false);
        };

        if reset_marker {
            story.update_marker = None;
        }
        if story.added_at.is_none() {
            story.added_at = Some(Utc::now());
        }

        match position(dest, id) {
            Some(index) => dest[index] = story,
            None => dest.push(story),
        }
        tracing::info!("Story {} moved to {:?}", id, target);

        self.persist()?;
        Ok(true)
    }

    pub fn set_update_marker(&mut self, id: i64, update_marker: Option<String>) -> Result<bool> {
        self.update(id, |story| story.update_marker = update_marker)
    }

    pub fn set_title(&mut self, id: i64, title: String) -> Result<bool> {
        self.update(id, |story| story.title = title)
    }

    pub fn set_priority(&mut self, id: i64, priority: Option<f64>) -> Result<bool> {
        self.update(id, |story| story.priority = priority)
    }

    pub fn set_description(&mut self, id: i64, description: Option<String>) -> Result<bool> {
        self.update(id, |story| story.description = description)
    }

    /// Apply `change` to the entry for `id`, watched list first.
    /// An id on neither list is left alone and is not an error.
    fn update(&mut self, id: i64, change: impl FnOnce(&mut Story)) -> Result<bool> {
        let Some(story) = self.locate_mut(id) else {
            return Ok(false);
        };

        change(story);
        self.persist()?;
        Ok(true)
    }

    fn locate_mut(&mut self, id: i64) -> Option<&mut Story> {
        if let Some(index) = position(&self.watched, id) {
            return Some(&mut self.watched[index]);
        }
        position(&self.ignored, id).map(|index| &mut self.ignored[index])
    }

    pub fn get(&self, id: i64) -> Option<&Story> {
        self.iter().find(|story| story.id == id)
    }

    pub fn is_watched(&self, id: i64) -> bool {
        position(&self.watched, id).is_some()
    }

    pub fn is_ignored(&self, id: i64) -> bool {
        position(&self.ignored, id).is_some()
    }

    /// Watched stories in the order they were added.
    pub fn watched(&self) -> impl Iterator<Item = &Story> {
        self.watched.iter()
    }

    /// Ignored stories in the order they were added.
    pub fn ignored(&self) -> impl Iterator<Item = &Story> {
        self.ignored.iter()
    }

    /// Every classified story, watched first.
    pub fn iter(&self) -> impl Iterator<Item = &Story> {
        self.watched.iter().chain(self.ignored.iter())
    }

    fn persist(&self) -> Result<()> {
        let document = ClassificationDocument {
            items: self.watched.clone(),
            ignored_items: self.ignored.clone(),
        };

        let bytes = serde_json::to_vec_pretty(&document)?;
        self.backend.write(&bytes)
    }
}

fn position(list: &[Story], id: i64) -> Option<usize> {
    list.iter().position(|story| story.id == id)
}
