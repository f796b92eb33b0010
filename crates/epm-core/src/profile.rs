//! Durable, ordered profile list.
//!
//! The whole list is stored as one JSON array under a single key; every save
//! is a full snapshot write.

use epm_protocol::Profile;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::persistence::{read_json, write_json, KeyValueStore, StorageError, PROFILES_KEY};

/// Errors that can occur during profile operations
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Profile name is empty after trimming
    #[error("profile name cannot be empty")]
    EmptyName,

    /// Writing the profile list failed
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Profile list persisted through a [`KeyValueStore`].
#[derive(Debug, Clone)]
pub struct ProfileStore<S: KeyValueStore> {
    backend: S,
    key: String,
}

impl<S: KeyValueStore> ProfileStore<S> {
    /// Store the list under the default `custom-endpoints` key.
    pub fn new(backend: S) -> Self {
        Self::with_key(backend, PROFILES_KEY)
    }

    /// Store the list under a custom key.
    pub fn with_key(backend: S, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// The underlying key-value store.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Load the stored list, in insertion order.
    ///
    /// Absent, unreadable or corrupt data yields an empty list; the failure
    /// is logged rather than returned. Entries that fail to decode on their
    /// own (e.g. an unknown provider tag) are skipped and the rest are kept.
    #[instrument(skip(self), fields(key = %self.key))]
    pub fn load(&self) -> Vec<Profile> {
        let entries = match read_json::<Vec<serde_json::Value>, _>(&self.backend, &self.key) {
            Ok(Some(entries)) => entries,
            Ok(None) => {
                debug!("No saved profiles");
                return Vec::new();
            }
            Err(e) => {
                warn!(error = %e, "Failed to read saved profiles, starting empty");
                return Vec::new();
            }
        };

        let total = entries.len();
        let profiles: Vec<Profile> = entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value(entry) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(index, error = %e, "Skipping unreadable saved profile");
                    None
                }
            })
            .collect();
        info!(count = profiles.len(), skipped = total - profiles.len(), "Loaded profiles");
        profiles
    }

    /// Replace the stored list with `profiles`.
    #[instrument(skip(self, profiles), fields(key = %self.key, count = profiles.len()))]
    pub fn save(&self, profiles: &[Profile]) -> Result<(), StorageError> {
        write_json(&self.backend, &self.key, profiles)?;
        info!("Saved profiles");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryKeyValueStore;
    use epm_protocol::{Credentials, Field, Provider};
    use pretty_assertions::assert_eq;

    fn profile(id: &str, provider: Provider, field: Field, value: &str) -> Profile {
        let mut credentials = Credentials::empty(provider);
        credentials.set(field, value);
        Profile::new(id, format!("profile-{id}"), credentials)
    }

    #[test]
    fn roundtrip_preserves_order_and_values() -> anyhow::Result<()> {
        let store = ProfileStore::new(MemoryKeyValueStore::new());
        let profiles = vec![
            profile("b", Provider::Tencent, Field::TencentSecretId, "tid"),
            profile("a", Provider::OpenAI, Field::OpenaiUrl, "https://example.com/v1"),
            profile("c", Provider::Iflytek, Field::IflytekApiSecret, "s3cret")
                .with_custom_models("spark"),
        ];

        store.save(&profiles)?;
        assert_eq!(store.load(), profiles);
        Ok(())
    }

    #[test]
    fn missing_blob_loads_empty() {
        let store = ProfileStore::new(MemoryKeyValueStore::new());
        assert!(store.load().is_empty());
    }

    #[test]
    fn corrupt_blob_loads_empty() -> anyhow::Result<()> {
        let backend = MemoryKeyValueStore::new();
        backend.set(PROFILES_KEY, "{\"not\": \"a list\"")?;
        let store = ProfileStore::new(backend);
        assert!(store.load().is_empty());
        Ok(())
    }

    #[test]
    fn save_replaces_previous_content() -> anyhow::Result<()> {
        let backend = MemoryKeyValueStore::new();
        let store = ProfileStore::with_key(backend.clone(), "endpoints");
        store.save(&[profile("a", Provider::XAI, Field::XaiApiKey, "x")])?;
        store.save(&[])?;

        assert!(store.load().is_empty());
        assert_eq!(store.backend().get(PROFILES_KEY)?, None);
        assert!(store.backend().get("endpoints")?.is_some());
        Ok(())
    }

    #[test]
    fn bad_entries_are_skipped() -> anyhow::Result<()> {
        let backend = MemoryKeyValueStore::new();
        backend.set(
            PROFILES_KEY,
            r#"[
                {"id": "1", "name": "deep", "provider": "DeepSeek", "deepseekApiKey": "d"},
                {"id": "2", "name": "work", "provider": "OpenAI", "openaiApiKey": "sk-1"},
                {"id": "3", "name": "gem", "provider": "Google", "googleSafetySettings": "BLOCK_ALL"},
                {"id": "4", "name": "kimi", "provider": "Moonshot"}
            ]"#,
        )?;

        let loaded = ProfileStore::new(backend).load();
        let ids: Vec<&str> = loaded.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "4"]);
        assert_eq!(loaded[0].credentials.get(Field::OpenaiApiKey), Some("sk-1"));
        Ok(())
    }
}
