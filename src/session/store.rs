//! Key-value persistence behind the session manager. The trait mirrors the
//! minimal get/set/remove surface the manager needs; the file backend is
//! the console counterpart of browser local storage.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

/// Minimal persistence capability the session manager depends on.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Volatile store; the default for `--ephemeral` runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// JSON-file-backed store. An unreadable or unparseable file is treated as
/// empty; write failures are logged and the in-memory view stays current.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let entries = Self::load(&path);
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(path) else {
            return HashMap::new();
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!("unreadable session file {}: {err}", path.display());
                HashMap::new()
            }
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("cannot create {}: {err}", parent.display());
                return;
            }
        }

        match serde_json::to_string_pretty(entries) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    warn!("cannot write {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("cannot serialize session state: {err}"),
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}

/// Default location of the persisted session file.
#[must_use]
pub fn default_session_file() -> Option<PathBuf> {
    let dirs = directories::ProjectDirs::from("dev", "bazaro", "bazaro")?;
    let dir = dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf();
    debug!("session state directory: {}", dir.display());
    Some(dir.join("session.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));

        store.set("k", "w");
        assert_eq!(store.get("k").as_deref(), Some("w"));

        store.remove("k");
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn remove_missing_key_is_a_noop() {
        let store = MemoryStore::new();
        store.remove("never-set");
        assert_eq!(store.get("never-set"), None);
    }

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create tempdir");
        let path = dir.path().join("session.json");

        let store = FileStore::open(path.clone());
        store.set("auth_token", "t1");
        store.set("user_name", "Ana");
        drop(store);

        let reopened = FileStore::open(path);
        assert_eq!(reopened.get("auth_token").as_deref(), Some("t1"));
        assert_eq!(reopened.get("user_name").as_deref(), Some("Ana"));
    }

    #[test]
    fn file_store_treats_corrupt_file_as_empty() {
        let dir = tempfile::tempdir().expect("Failed to create tempdir");
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").expect("Failed to write");

        let store = FileStore::open(path);
        assert_eq!(store.get("auth_token"), None);
    }

    #[test]
    fn file_store_creates_parent_directories() {
        let dir = tempfile::tempdir().expect("Failed to create tempdir");
        let path = dir.path().join("nested/state/session.json");

        let store = FileStore::open(path.clone());
        store.set("k", "v");

        assert!(path.exists());
    }
}
