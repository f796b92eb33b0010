//! Shared, transactionally updated state records.

use std::sync::Arc;

use parking_lot::RwLock;

/// A shared record updated through a mutator callback.
///
/// The mutator works on a draft; the draft replaces the current value only
/// once the mutator returns. Readers see either the old or the new value,
/// never a partially mutated one.
pub trait StateCell<T>: Send + Sync {
    /// Clone of the current value.
    fn snapshot(&self) -> T;

    /// Mutate a draft of the current value and commit it.
    fn update<F: FnOnce(&mut T)>(&self, mutator: F);
}

/// Default [`StateCell`]: copy-modify-replace under a write lock.
/// Clones share the same value.
#[derive(Debug, Default)]
pub struct SharedState<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> SharedState<T> {
    /// Wrap an initial value
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Clone + Send + Sync> StateCell<T> for SharedState<T> {
    fn snapshot(&self) -> T {
        self.inner.read().clone()
    }

    fn update<F: FnOnce(&mut T)>(&self, mutator: F) {
        let mut current = self.inner.write();
        let mut draft = current.clone();
        mutator(&mut draft);
        *current = draft;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn update_commits_draft() {
        let cell = SharedState::new(vec![1]);
        let other = cell.clone();
        cell.update(|v| v.push(2));
        assert_eq!(other.snapshot(), vec![1, 2]);
    }

    #[test]
    fn panicking_mutator_leaves_value_untouched() {
        let cell = SharedState::new(String::from("before"));
        let result = catch_unwind(AssertUnwindSafe(|| {
            cell.update(|s| {
                s.push_str("-partial");
                panic!("mutator failed");
            })
        }));
        assert!(result.is_err());
        assert_eq!(cell.snapshot(), "before");
    }
}
