//! Key-value persistence for profile lists and configuration records.
//!
//! Provides:
//! - The [`KeyValueStore`] collaborator trait (`get` / `set` of text blobs)
//! - A file-backed store, one file per key under the data directory
//! - An in-memory store for tests and embedding
//! - JSON helpers shared by every typed record kept in a store

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, instrument};

/// Key holding the saved profile list.
pub const PROFILES_KEY: &str = "custom-endpoints";
/// Key holding the active [`AccessConfig`](epm_protocol::AccessConfig).
pub const ACCESS_KEY: &str = "access-control";
/// Key holding the [`AppConfig`](epm_protocol::AppConfig).
pub const APP_CONFIG_KEY: &str = "app-config";
/// Key holding the id of the last applied profile.
pub const SELECTION_KEY: &str = "selected-endpoint";

/// Errors raised by a [`KeyValueStore`] or while encoding its contents
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO operation failed
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Key cannot be mapped onto the backend
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),

    /// Stored value is not valid JSON for the expected type
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Text blob storage addressed by a fixed logical key.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Decode a JSON value stored under `key`. Absent keys yield `Ok(None)`.
pub fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`.
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> Result<(), StorageError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let data = serde_json::to_string_pretty(value)?;
    store.set(key, &data)
}

/// Stores each key as `<dir>/<key>.json`.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so a crash never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileKeyValueStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No stored value");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(path = %path.display(), "Stored value");
        Ok(())
    }
}

/// In-memory store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epm_protocol::AppConfig;

    #[test]
    fn memory_store_roundtrip() -> anyhow::Result<()> {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("k")?, None);

        store.set("k", "v1")?;
        store.set("k", "v2")?;
        assert_eq!(store.get("k")?.as_deref(), Some("v2"));

        let shared = store.clone();
        assert_eq!(shared.get("k")?.as_deref(), Some("v2"));
        Ok(())
    }

    #[test]
    fn file_store_roundtrip() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let store = FileKeyValueStore::new(dir.path().join("nested"));

        assert_eq!(store.get(PROFILES_KEY)?, None);
        store.set(PROFILES_KEY, "[]")?;
        assert_eq!(store.get(PROFILES_KEY)?.as_deref(), Some("[]"));
        assert!(dir.path().join("nested").join("custom-endpoints.json").exists());
        Ok(())
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileKeyValueStore::new(dir.path());

        for key in ["", "../escape", "a/b", ".hidden"] {
            assert!(
                matches!(store.set(key, "x"), Err(StorageError::InvalidKey(_))),
                "key {key:?} accepted"
            );
        }
    }

    #[test]
    fn json_helpers() -> anyhow::Result<()> {
        let store = MemoryKeyValueStore::new();
        assert_eq!(read_json::<AppConfig, _>(&store, APP_CONFIG_KEY)?, None);

        let config = AppConfig {
            custom_models: "gpt-4o,claude".to_string(),
        };
        write_json(&store, APP_CONFIG_KEY, &config)?;
        assert_eq!(read_json::<AppConfig, _>(&store, APP_CONFIG_KEY)?, Some(config));

        store.set(APP_CONFIG_KEY, "{not json")?;
        assert!(matches!(
            read_json::<AppConfig, _>(&store, APP_CONFIG_KEY),
            Err(StorageError::Json(_))
        ));
        Ok(())
    }
}
