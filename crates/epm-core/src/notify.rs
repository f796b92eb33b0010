//! User feedback sink. The manager never calls it; front ends do, after each
//! operation.

use std::fmt;

use tracing::info;

use crate::manager::{DeleteOutcome, SaveOutcome};

/// A user-facing message for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Save was attempted with a blank name
    NameRequired,
    /// A new profile was saved
    Created(String),
    /// An existing profile was updated
    Updated(String),
    /// A profile was deleted
    Deleted(String),
    /// A profile was duplicated; holds the copy's name
    Duplicated(String),
    /// A profile was applied
    Applied(String),
    /// The active configuration was cleared
    Cleared,
}

impl Notice {
    /// `Created` or `Updated`, depending on the outcome.
    pub fn saved(outcome: &SaveOutcome) -> Self {
        let name = outcome.saved.name.clone();
        if outcome.created {
            Notice::Created(name)
        } else {
            Notice::Updated(name)
        }
    }

    /// `Deleted`, or `None` when nothing was removed.
    pub fn deleted(outcome: &DeleteOutcome) -> Option<Self> {
        outcome
            .removed
            .as_ref()
            .map(|p| Notice::Deleted(p.name.clone()))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NameRequired => write!(f, "Enter a profile name"),
            Notice::Created(name) => write!(f, "Saved new profile: {name}"),
            Notice::Updated(name) => write!(f, "Updated profile: {name}"),
            Notice::Deleted(name) => write!(f, "Deleted profile: {name}"),
            Notice::Duplicated(name) => write!(f, "Duplicated profile: {name}"),
            Notice::Applied(name) => write!(f, "Applied profile: {name}"),
            Notice::Cleared => write!(f, "Cleared all endpoint settings"),
        }
    }
}

/// Fire-and-forget message sink.
pub trait Notifier {
    /// Show `notice` to the user.
    fn notify(&self, notice: &Notice);
}

/// Sends notices to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        info!(%notice, "notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epm_protocol::{Credentials, Profile, Provider};

    fn profile(name: &str) -> Profile {
        Profile::new("1", name, Credentials::empty(Provider::OpenAI))
    }

    #[test]
    fn saved_notice_follows_outcome() {
        let mut outcome = SaveOutcome {
            profiles: vec![],
            saved: profile("work"),
            created: true,
        };
        assert_eq!(Notice::saved(&outcome), Notice::Created("work".into()));

        outcome.created = false;
        assert_eq!(Notice::saved(&outcome).to_string(), "Updated profile: work");
    }

    #[test]
    fn delete_noop_has_no_notice() {
        let outcome = DeleteOutcome {
            profiles: vec![],
            removed: None,
            was_applied: false,
        };
        assert_eq!(Notice::deleted(&outcome), None);
    }

    #[test]
    fn notifiers_are_object_safe() {
        let sinks: Vec<Box<dyn Notifier>> = vec![Box::new(TracingNotifier)];
        for sink in &sinks {
            sink.notify(&Notice::Cleared);
        }
        assert_eq!(Notice::Cleared.to_string(), "Cleared all endpoint settings");
    }
}
