mod preferences;

pub use preferences::{PreferenceStore, NOTIFICATION_SETTINGS_KEY};

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{NotifyError, Result};

/// Returns `~/.config/flowfocus[-dev]/` based on FLOWFOCUS_ENV.
///
/// Set FLOWFOCUS_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWFOCUS_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowfocus-dev")
    } else {
        base_dir.join("flowfocus")
    };

    std::fs::create_dir_all(&dir).map_err(|e| NotifyError::DataDir(e.to_string()))?;
    Ok(dir)
}

/// Durable string key-value storage.
///
/// Writes must be atomic: a reader sees either the previous value or the new
/// one, never a torn write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// One `<key>.json` file per key inside a directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open the store in the application data directory.
    pub fn open() -> Result<Self> {
        Ok(Self { dir: data_dir()? })
    }

    /// Open the store in a custom directory (tests, embedding hosts).
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn storage_error(path: &Path, source: std::io::Error) -> NotifyError {
    NotifyError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_error(&self.dir, e))?;
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        std::fs::write(&tmp, value).map_err(|e| storage_error(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            storage_error(&path, e)
        })
    }
}

/// In-memory store. Writes can be made to fail for exercising recovery paths.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing failure injection.
    pub fn with_entry(self, key: &str, value: &str) -> Self {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *lock(&self.fail_reads) = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *lock(&self.fail_writes) = fail;
    }

    /// Raw stored value, bypassing failure injection.
    pub fn raw(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn injected(operation: &str) -> NotifyError {
    storage_error(
        Path::new("memory"),
        std::io::Error::new(std::io::ErrorKind::Other, format!("injected {operation} failure")),
    )
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if *lock(&self.fail_reads) {
            return Err(injected("read"));
        }
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if *lock(&self.fail_writes) {
            return Err(injected("write"));
        }
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());
        assert_eq!(store.get("nothing").unwrap(), None);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());

        store.set("notification_settings", r#"{"enabled":false}"#).unwrap();
        assert_eq!(
            store.get("notification_settings").unwrap().as_deref(),
            Some(r#"{"enabled":false}"#)
        );
        assert!(dir.path().join("notification_settings.json").exists());
        assert!(!dir.path().join("notification_settings.json.tmp").exists());
    }

    #[test]
    fn file_store_overwrite_replaces_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());

        store.set("k", "first").unwrap();
        store.set("k", "second").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn file_store_creates_missing_directory_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let store = FileStore::with_dir(&nested);

        store.set("k", "v").unwrap();
        assert_eq!(store.dir(), nested.as_path());
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn memory_store_failure_injection() {
        let store = MemoryStore::new().with_entry("k", "v");

        store.set_fail_writes(true);
        assert!(store.set("k", "new").is_err());
        assert_eq!(store.raw("k").as_deref(), Some("v"));

        store.set_fail_reads(true);
        assert!(store.get("k").is_err());

        store.set_fail_reads(false);
        store.set_fail_writes(false);
        store.set("k", "new").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("new"));
    }
}
