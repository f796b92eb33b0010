//! Edit affordance state: `Idle` <-> `Editing(id)`.

use epm_protocol::{AccessConfig, AppConfig, Profile};

use crate::manager::{DeleteOutcome, ProfileManager, SaveOutcome};
use crate::persistence::KeyValueStore;
use crate::profile::ProfileError;
use crate::state::StateCell;

/// Whether the name field currently targets an existing profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState {
    /// Saving creates a new profile
    #[default]
    Idle,
    /// Saving replaces the profile with this id
    Editing(String),
}

/// The name field plus its [`EditState`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditSession {
    state: EditState,
    name: String,
}

impl EditSession {
    /// An idle session with an empty name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Current name field contents.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Id of the profile being edited, if any.
    pub fn editing_id(&self) -> Option<&str> {
        match &self.state {
            EditState::Editing(id) => Some(id),
            EditState::Idle => None,
        }
    }

    /// Replace the name field contents.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Start editing `profile`: it is applied, and its name pre-fills the
    /// name field.
    pub fn begin<S, A, M>(&mut self, manager: &ProfileManager<S, A, M>, profile: &Profile)
    where
        S: KeyValueStore,
        A: StateCell<AccessConfig>,
        M: StateCell<AppConfig>,
    {
        manager.apply(profile);
        self.name = profile.name.clone();
        self.state = EditState::Editing(profile.id.clone());
    }

    /// Back to `Idle` with an empty name.
    pub fn cancel(&mut self) {
        self.state = EditState::Idle;
        self.name.clear();
    }

    /// Save the active configuration under the current name: an update
    /// while editing, a create while idle. Returns to `Idle` on success and
    /// keeps the state on failure.
    pub fn commit<S, A, M>(
        &mut self,
        manager: &ProfileManager<S, A, M>,
    ) -> Result<SaveOutcome, ProfileError>
    where
        S: KeyValueStore,
        A: StateCell<AccessConfig>,
        M: StateCell<AppConfig>,
    {
        let outcome = manager.save_current(&self.name, self.editing_id())?;
        self.cancel();
        Ok(outcome)
    }

    /// React to a delete: editing a profile that no longer exists ends the
    /// edit.
    pub fn on_deleted(&mut self, outcome: &DeleteOutcome) {
        let removed_id = outcome.removed.as_ref().map(|p| p.id.as_str());
        if removed_id.is_some() && removed_id == self.editing_id() {
            self.cancel();
        }
    }
}
