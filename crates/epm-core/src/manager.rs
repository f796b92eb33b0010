//! Profile manager: snapshot, apply, and CRUD over the saved profile list.
//!
//! Every mutating operation takes the manager's lock for its whole duration,
//! so `apply`, `save`, `duplicate`, `delete` and `clear_active` never
//! interleave on one manager instance.

use epm_protocol::{fields_of, AccessConfig, AppConfig, Credentials, Profile, Provider};
use parking_lot::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::config::EpmConfig;
use crate::persistence::KeyValueStore;
use crate::profile::{ProfileError, ProfileStore};
use crate::state::{SharedState, StateCell};

/// Result of [`ProfileManager::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// The full list after the save
    pub profiles: Vec<Profile>,
    /// The stored record, with its final id
    pub saved: Profile,
    /// `true` when appended, `false` when an existing entry was replaced
    pub created: bool,
}

/// Result of [`ProfileManager::delete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// The full list after the delete
    pub profiles: Vec<Profile>,
    /// The removed profile, `None` if the id was not present
    pub removed: Option<Profile>,
    /// Whether the removed profile was the currently applied one
    pub was_applied: bool,
}

/// Manages saved endpoint profiles and applies them to the active
/// configuration.
pub struct ProfileManager<S, A = SharedState<AccessConfig>, M = SharedState<AppConfig>>
where
    S: KeyValueStore,
    A: StateCell<AccessConfig>,
    M: StateCell<AppConfig>,
{
    store: ProfileStore<S>,
    access: A,
    app: M,
    copy_suffix: String,
    default_provider: Provider,
    inner: Mutex<Inner>,
}

struct Inner {
    profiles: Vec<Profile>,
    /// Id of the last applied profile
    applied: Option<String>,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Phase 1 of apply: every provider's fields back to defaults.
fn reset_phase(access: &mut AccessConfig) {
    access.reset_credentials();
}

/// Phase 2 of apply: select the provider and copy its fields in. Absent
/// fields become empty.
fn set_phase(access: &mut AccessConfig, credentials: &Credentials) {
    let provider = credentials.provider();
    access.provider = provider;
    for &field in fields_of(provider) {
        access.set(field, credentials.get(field).unwrap_or_default());
    }
    if provider.has_safety_settings() {
        access.google_safety_settings = credentials.safety_settings().unwrap_or_default();
    }
}

impl<S, A, M> ProfileManager<S, A, M>
where
    S: KeyValueStore,
    A: StateCell<AccessConfig>,
    M: StateCell<AppConfig>,
{
    /// Create a manager, loading the saved list from `store`.
    pub fn new(store: ProfileStore<S>, access: A, app: M) -> Self {
        let profiles = store.load();
        let defaults = EpmConfig::default();
        Self {
            store,
            access,
            app,
            copy_suffix: defaults.copy_suffix,
            default_provider: defaults.default_provider,
            inner: Mutex::new(Inner {
                profiles,
                applied: None,
            }),
        }
    }

    /// Take the copy suffix and default provider from `config`.
    pub fn with_config(mut self, config: &EpmConfig) -> Self {
        self.copy_suffix = config.copy_suffix.clone();
        self.default_provider = config.default_provider;
        self
    }

    /// Restore the applied-profile marker, e.g. across process restarts.
    /// Ignored if no saved profile has that id.
    pub fn with_applied(self, id: Option<&str>) -> Self {
        {
            let mut inner = self.inner.lock();
            let known = id.filter(|id| inner.profiles.iter().any(|p| p.id == *id));
            inner.applied = known.map(str::to_string);
        }
        self
    }

    /// The active configuration handle.
    pub fn access(&self) -> &A {
        &self.access
    }

    /// The app configuration handle.
    pub fn app(&self) -> &M {
        &self.app
    }

    /// All saved profiles, in insertion order.
    pub fn list(&self) -> Vec<Profile> {
        self.inner.lock().profiles.clone()
    }

    /// Look up a saved profile by id.
    pub fn get(&self, id: &str) -> Option<Profile> {
        self.inner.lock().profiles.iter().find(|p| p.id == id).cloned()
    }

    /// Id of the currently applied profile, if any.
    pub fn applied(&self) -> Option<String> {
        self.inner.lock().applied.clone()
    }

    /// Build a new profile from the active configuration.
    ///
    /// Only the fields of the active provider are copied; every other
    /// provider's fields are absent on the result.
    pub fn snapshot_from_active(&self, name: &str) -> Profile {
        let _guard = self.inner.lock();
        self.snapshot_locked(name)
    }

    /// Reads both cells; callers hold the manager lock so no apply can
    /// commit in between.
    fn snapshot_locked(&self, name: &str) -> Profile {
        let access = self.access.snapshot();
        let app = self.app.snapshot();

        let mut credentials = Credentials::empty(access.provider);
        for &field in fields_of(access.provider) {
            credentials.set(field, access.get(field));
        }
        credentials.set_safety_settings(access.google_safety_settings);

        Profile {
            id: new_id(),
            name: name.to_string(),
            custom_models: Some(app.custom_models),
            credentials,
        }
    }

    /// Store `profile`.
    ///
    /// With an `editing_id` matching a saved profile, that entry is replaced
    /// in place and keeps its id. Otherwise the profile is appended under a
    /// freshly generated id. The name is trimmed; a blank name is rejected
    /// without touching anything.
    #[instrument(skip(self, profile), fields(provider = %profile.provider()))]
    pub fn save(
        &self,
        profile: Profile,
        editing_id: Option<&str>,
    ) -> Result<SaveOutcome, ProfileError> {
        if profile.name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let mut inner = self.inner.lock();
        self.save_locked(&mut inner, profile, editing_id)
    }

    fn save_locked(
        &self,
        inner: &mut Inner,
        mut profile: Profile,
        editing_id: Option<&str>,
    ) -> Result<SaveOutcome, ProfileError> {
        let name = profile.name.trim();
        if name.is_empty() {
            return Err(ProfileError::EmptyName);
        }
        profile.name = name.to_string();

        let mut next = inner.profiles.clone();
        let position = editing_id.and_then(|id| next.iter().position(|p| p.id == id));

        let created = match position {
            Some(idx) => {
                profile.id = next[idx].id.clone();
                next[idx] = profile.clone();
                false
            }
            None => {
                if let Some(id) = editing_id {
                    debug!(id, "Edited profile no longer exists, saving as new");
                }
                profile.id = new_id();
                next.push(profile.clone());
                true
            }
        };

        self.store.save(&next)?;
        inner.profiles = next.clone();
        info!(id = %profile.id, created, "Saved profile");

        Ok(SaveOutcome {
            profiles: next,
            saved: profile,
            created,
        })
    }

    /// Snapshot the active configuration as `name` and save it, without
    /// letting an apply run in between.
    pub fn save_current(
        &self,
        name: &str,
        editing_id: Option<&str>,
    ) -> Result<SaveOutcome, ProfileError> {
        if name.trim().is_empty() {
            return Err(ProfileError::EmptyName);
        }
        let mut inner = self.inner.lock();
        let profile = self.snapshot_locked(name);
        self.save_locked(&mut inner, profile, editing_id)
    }

    /// Make `profile` the active configuration.
    ///
    /// All provider fields are reset first, then the profile's provider and
    /// fields are written, inside one committed update. The profile's custom
    /// models replace the app-level list. It becomes the [`applied`] profile
    /// only if it is in the saved list.
    ///
    /// [`applied`]: ProfileManager::applied
    pub fn apply(&self, profile: &Profile) {
        let mut inner = self.inner.lock();
        self.apply_locked(&mut inner, profile);
    }

    /// Apply the saved profile with `id`. Returns `None`, changing nothing,
    /// if there is no such profile.
    pub fn apply_by_id(&self, id: &str) -> Option<Profile> {
        let mut inner = self.inner.lock();
        let profile = inner.profiles.iter().find(|p| p.id == id).cloned()?;
        self.apply_locked(&mut inner, &profile);
        Some(profile)
    }

    #[instrument(skip(self, inner, profile), fields(id = %profile.id, provider = %profile.provider()))]
    fn apply_locked(&self, inner: &mut Inner, profile: &Profile) {
        self.access.update(|access| {
            reset_phase(access);
            set_phase(access, &profile.credentials);
        });
        let models = profile.custom_models.clone().unwrap_or_default();
        self.app.update(|app| app.custom_models = models);
        let saved = inner.profiles.iter().any(|p| p.id == profile.id);
        inner.applied = saved.then(|| profile.id.clone());
        info!(saved, "Applied profile");
    }

    /// Append a copy of `profile` under a new id, with the copy suffix added
    /// to its name. The source is left untouched.
    #[instrument(skip(self, profile), fields(source = %profile.id))]
    pub fn duplicate(&self, profile: &Profile) -> Result<Profile, ProfileError> {
        let mut copy = profile.clone();
        copy.id = new_id();
        copy.name = format!("{}{}", profile.name, self.copy_suffix);

        let mut inner = self.inner.lock();
        let mut next = inner.profiles.clone();
        next.push(copy.clone());
        self.store.save(&next)?;
        inner.profiles = next;
        info!(id = %copy.id, "Duplicated profile");
        Ok(copy)
    }

    /// Remove the profile with `id`. An unknown id is a no-op.
    #[instrument(skip(self))]
    pub fn delete(&self, id: &str) -> Result<DeleteOutcome, ProfileError> {
        let mut inner = self.inner.lock();
        let Some(idx) = inner.profiles.iter().position(|p| p.id == id) else {
            debug!("No profile with this id");
            return Ok(DeleteOutcome {
                profiles: inner.profiles.clone(),
                removed: None,
                was_applied: false,
            });
        };

        let mut next = inner.profiles.clone();
        let removed = next.remove(idx);
        self.store.save(&next)?;
        inner.profiles = next.clone();

        let was_applied = inner.applied.as_deref() == Some(id);
        if was_applied {
            inner.applied = None;
        }
        info!(was_applied, "Deleted profile");

        Ok(DeleteOutcome {
            profiles: next,
            removed: Some(removed),
            was_applied,
        })
    }

    /// Reset the active configuration to defaults: every provider's fields
    /// cleared, the default provider selected and custom models emptied.
    #[instrument(skip(self))]
    pub fn clear_active(&self) {
        let mut inner = self.inner.lock();
        let provider = self.default_provider;
        self.access.update(|access| {
            reset_phase(access);
            access.provider = provider;
        });
        self.app.update(|app| app.custom_models.clear());
        inner.applied = None;
        info!("Cleared active configuration");
    }
}

impl<S, A, M> std::fmt::Debug for ProfileManager<S, A, M>
where
    S: KeyValueStore,
    A: StateCell<AccessConfig>,
    M: StateCell<AppConfig>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ProfileManager")
            .field("profiles", &inner.profiles.len())
            .field("applied", &inner.applied)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryKeyValueStore;
    use epm_protocol::{Field, SafetyThreshold};
    use pretty_assertions::assert_eq;

    fn manager() -> ProfileManager<MemoryKeyValueStore> {
        ProfileManager::new(
            ProfileStore::new(MemoryKeyValueStore::new()),
            SharedState::default(),
            SharedState::default(),
        )
    }

    #[test]
    fn snapshot_copies_only_active_provider() {
        let manager = manager();
        manager.access().update(|a| {
            a.provider = Provider::Baidu;
            a.set(Field::BaiduApiKey, "bk");
            a.set(Field::BaiduSecretKey, "bs");
        });

        let profile = manager.snapshot_from_active("ernie");
        assert_eq!(profile.provider(), Provider::Baidu);
        assert_eq!(profile.credentials.get(Field::BaiduApiKey), Some("bk"));
        assert_eq!(profile.credentials.get(Field::BaiduSecretKey), Some("bs"));
        assert_eq!(profile.credentials.get(Field::BaiduUrl), Some(""));
        assert_eq!(profile.custom_models.as_deref(), Some(""));
    }

    #[test]
    fn snapshot_captures_safety_threshold() {
        let manager = manager();
        manager.access().update(|a| {
            a.provider = Provider::Google;
            a.google_safety_settings = SafetyThreshold::BlockLowAndAbove;
        });
        let profile = manager.snapshot_from_active("gemini");
        assert_eq!(
            profile.credentials.safety_settings(),
            Some(SafetyThreshold::BlockLowAndAbove)
        );
    }

    #[test]
    fn blank_name_is_rejected_without_mutation() {
        let manager = manager();
        let profile = manager.snapshot_from_active("   ");
        assert!(matches!(
            manager.save(profile, None),
            Err(ProfileError::EmptyName)
        ));
        assert!(matches!(
            manager.save_current("", None),
            Err(ProfileError::EmptyName)
        ));
        assert!(manager.list().is_empty());
    }

    #[test]
    fn save_trims_name() -> anyhow::Result<()> {
        let manager = manager();
        let outcome = manager.save_current("  work  ", None)?;
        assert_eq!(outcome.saved.name, "work");
        Ok(())
    }

    #[test]
    fn apply_resets_safety_threshold_when_leaving_google() {
        let manager = manager();
        manager.access().update(|a| {
            a.provider = Provider::Google;
            a.set(Field::GoogleApiKey, "g");
            a.google_safety_settings = SafetyThreshold::BlockOnlyHigh;
        });

        let mut credentials = Credentials::empty(Provider::Anthropic);
        credentials.set(Field::AnthropicApiKey, "ak");
        manager.apply(&Profile::new("p", "claude", credentials));

        let access = manager.access().snapshot();
        assert_eq!(access.provider, Provider::Anthropic);
        assert_eq!(access.google_safety_settings, SafetyThreshold::BlockNone);
        assert_eq!(access.get(Field::GoogleApiKey), "");
        assert!(access.is_isolated());
    }

    #[test]
    fn applying_unsaved_profile_clears_marker() -> anyhow::Result<()> {
        let manager = manager();
        let saved = manager.save_current("work", None)?.saved;
        manager.apply(&saved);
        assert_eq!(manager.applied(), Some(saved.id.clone()));

        let unsaved = Profile::new("draft", "draft", Credentials::empty(Provider::XAI));
        manager.apply(&unsaved);
        assert_eq!(manager.access().snapshot().provider, Provider::XAI);
        assert_eq!(manager.applied(), None);
        assert_eq!(manager.get("draft"), None);
        Ok(())
    }

    #[test]
    fn apply_by_unknown_id_changes_nothing() {
        let manager = manager();
        manager.access().update(|a| a.set(Field::OpenaiApiKey, "sk"));
        let before = manager.access().snapshot();

        assert_eq!(manager.apply_by_id("missing"), None);
        assert_eq!(manager.access().snapshot(), before);
        assert_eq!(manager.applied(), None);
    }

    #[test]
    fn with_applied_ignores_unknown_ids() -> anyhow::Result<()> {
        let backend = MemoryKeyValueStore::new();
        let first = ProfileManager::new(
            ProfileStore::new(backend.clone()),
            SharedState::default(),
            SharedState::default(),
        );
        let saved = first.save_current("work", None)?.saved;

        let reopened = ProfileManager::new(
            ProfileStore::new(backend),
            SharedState::<AccessConfig>::default(),
            SharedState::<AppConfig>::default(),
        );
        let reopened = reopened.with_applied(Some(saved.id.as_str()));
        assert_eq!(reopened.applied(), Some(saved.id));

        let reopened = reopened.with_applied(Some("gone"));
        assert_eq!(reopened.applied(), None);
        Ok(())
    }

    #[test]
    fn clear_uses_configured_default_provider() {
        let config = EpmConfig {
            default_provider: Provider::Azure,
            ..EpmConfig::default()
        };
        let manager = manager().with_config(&config);
        manager.access().update(|a| {
            a.provider = Provider::Moonshot;
            a.set(Field::MoonshotApiKey, "m");
        });
        manager.app().update(|a| a.custom_models = "kimi".into());

        manager.clear_active();

        let mut expected = AccessConfig::default();
        expected.provider = Provider::Azure;
        assert_eq!(manager.access().snapshot(), expected);
        assert_eq!(manager.app().snapshot().custom_models, "");
    }
}
