use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::Story;
use crate::store::{Backend, ClassificationStore, MemoryBackend};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheDocument {
    #[serde(default)]
    items: Vec<Story>,
}

/// Last observed state of every story, keyed by id.
pub struct CacheStore {
    items: HashMap<i64, Story>,
    backend: Box<dyn Backend + Send>,
}

impl CacheStore {
    /// Load the store from `backend`; a backend with no document is an empty store.
    pub fn open<B: Backend + Send + 'static>(backend: B) -> Result<Self> {
        let document = match backend.read()? {
            Some(bytes) => serde_json::from_slice::<CacheDocument>(&bytes)?,
            None => CacheDocument::default(),
        };

        let items = document
            .items
            .into_iter()
            .map(|story| (story.id, story))
            .collect::<HashMap<_, _>>();
        tracing::debug!("Loaded {} cached stories", items.len());

        Ok(Self {
            items,
            backend: Box::new(backend),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            items: HashMap::new(),
            backend: Box::new(MemoryBackend::new()),
        }
    }

    /// Store `story` unless the cached copy carries the same update marker.
    ///
    /// Returns `true` when the record was new or changed (and was persisted),
    /// `false` when nothing was written.
    pub fn upsert(&mut self, story: Story) -> Result<bool> {
        if let Some(cached) = self.items.get(&story.id) {
            if cached.update_marker == story.update_marker {
                return Ok(false);
            }
        }

        tracing::debug!("Cache updated for story {}", story.id);
        self.items.insert(story.id, story);
        self.persist()?;
        Ok(true)
    }

    pub fn get(&self, id: i64) -> Option<&Story> {
        self.items.get(&id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Story> {
        self.items.values()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Insert every classified story the cache has never seen, with its
    /// marker cleared so it shows up as changed on the next sync.
    pub fn seed_from(&mut self, classification: &ClassificationStore) -> Result<usize> {
        let mut seeded = 0;

        for story in classification.iter() {
            if self.items.contains_key(&story.id) {
                continue;
            }
            let mut cached = story.without_annotations();
            cached.update_marker = None;
            self.items.insert(cached.id, cached);
            seeded += 1;
        }

        if seeded > 0 {
            tracing::info!("Seeded cache with {} classified stories", seeded);
            self.persist()?;
        }

        Ok(seeded)
    }

    fn persist(&self) -> Result<()> {
        let mut items: Vec<Story> = self.items.values().cloned().collect();
        items.sort_by_key(|story| story.id);

        let bytes = serde_json::to_vec(&CacheDocument { items })?;
        self.backend.write(&bytes)
    }
}
