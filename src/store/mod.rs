pub mod backend;
pub mod cache;
pub mod classification;

use crate::app::Result;

pub use backend::{JsonFile, MemoryBackend};
pub use cache::CacheStore;
pub use classification::ClassificationStore;

/// Whole-document persistence for a store.
///
/// Stores always rewrite their entire document; a backend only has to read
/// back the last document written, or `None` when nothing was ever written.
pub trait Backend {
    fn read(&self) -> Result<Option<Vec<u8>>>;
    fn write(&self, bytes: &[u8]) -> Result<()>;
}
