//! History persistence boundary
//!
//! A store holds one serialized value under a fixed namespace, with
//! get-all / set-all semantics. [`FileStore`] replaces its file atomically
//! (write to a temporary sibling, then rename).

use magicinput_core::{Error, Result};
use parking_lot::Mutex;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Namespace the ledger is stored under
pub const HISTORY_NAMESPACE: &str = "clipboard-history";

/// Backing store for the serialized ledger
pub trait HistoryStore: Send + Sync {
    /// Read the stored value, `None` if nothing has been stored
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored value
    fn save(&self, data: &str) -> Result<()>;

    /// Delete the stored value; absent values are not an error
    fn remove(&self) -> Result<()>;
}

/// File-backed store at `<dir>/clipboard-history.json`
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store inside `dir`; the directory is created on first save
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", HISTORY_NAMESPACE)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl HistoryStore for FileStore {
    fn load(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::persistence(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, data: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let temp = self.temp_path();
        std::fs::write(&temp, data)?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            Error::persistence(format!("failed to replace {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), bytes = data.len(), "History saved");
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a pre-existing stored value
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Mutex::new(Some(value.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Make every subsequent save and remove fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Current stored value
    pub fn value(&self) -> Option<String> {
        self.value.lock().clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::persistence("store is read-only"));
        }
        Ok(())
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.value.lock().clone())
    }

    fn save(&self, data: &str) -> Result<()> {
        self.check_writable()?;
        *self.value.lock() = Some(data.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.check_writable()?;
        *self.value.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path().join("nested"));

        assert_eq!(store.load().unwrap(), None);

        store.save("[1,2,3]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("[1,2,3]"));
        assert!(store.path().ends_with("clipboard-history.json"));
        assert!(!store.temp_path().exists());

        store.save("[]").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_remove() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::new(temp_dir.path());

        store.remove().unwrap();
        store.save("[]").unwrap();
        store.remove().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_memory_store_failure_switch() {
        let store = MemoryStore::with_value("[]");
        store.fail_writes(true);

        assert!(store.save("x").is_err());
        assert!(store.remove().is_err());
        assert_eq!(store.value().as_deref(), Some("[]"));
    }
}
