use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::NamedTempFile;

use crate::app::{Result, StorywatchError};
use crate::store::Backend;

/// JSON document on disk, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for JsonFile {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        // Write next to the target so the final rename stays on one filesystem.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), self.path.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    contents: Option<Vec<u8>>,
    writes: usize,
}

/// In-memory backend; clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(bytes: impl Into<Vec<u8>>) -> Self {
        let backend = Self::default();
        if let Ok(mut state) = backend.state.lock() {
            state.contents = Some(bytes.into());
        }
        backend
    }

    /// Number of writes performed so far.
    pub fn writes(&self) -> usize {
        self.state.lock().map(|s| s.writes).unwrap_or_default()
    }

    pub fn contents(&self) -> Option<Vec<u8>> {
        self.state.lock().ok().and_then(|s| s.contents.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| StorywatchError::Io(io::Error::other(e.to_string())))
    }
}

impl Backend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.contents.clone())
    }

    fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.lock()?;
        state.contents = Some(bytes.to_vec());
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_file_missing_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("absent.json"));
        assert!(file.read().unwrap().is_none());
    }

    #[test]
    fn test_json_file_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("nested").join("data.json"));

        file.write(b"{\"items\":[]}").unwrap();
        assert_eq!(file.read().unwrap().unwrap(), b"{\"items\":[]}");

        file.write(b"{}").unwrap();
        assert_eq!(file.read().unwrap().unwrap(), b"{}");
    }

    #[test]
    fn test_json_file_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = JsonFile::new(dir.path().join("data.json"));
        file.write(b"one").unwrap();
        file.write(b"two").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("data.json")]);
    }

    #[test]
    fn test_json_file_failed_write_keeps_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("data.json");
        let file = JsonFile::new(&target);
        file.write(b"previous").unwrap();

        // The parent path is a regular file, so the write fails before any rename.
        let blocked = JsonFile::new(target.join("child.json"));
        assert!(blocked.write(b"next").is_err());

        assert_eq!(file.read().unwrap().unwrap(), b"previous");
    }

    #[test]
    fn test_memory_backend_counts_writes() {
        let backend = MemoryBackend::new();
        let shared = backend.clone();
        assert!(backend.read().unwrap().is_none());

        backend.write(b"a").unwrap();
        backend.write(b"b").unwrap();

        assert_eq!(shared.writes(), 2);
        assert_eq!(shared.contents().unwrap(), b"b");
    }
}
