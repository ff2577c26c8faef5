//! Active policy store
//!
//! Holds the process-wide policy theory. Readers take an `Arc` snapshot, so
//! a concurrent `replace` can never corrupt an in-flight verification: the
//! verification keeps resolving against the theory it started with.

use std::sync::{Arc, RwLock};

use crate::theory::Theory;

/// Snapshot-on-read holder for the active policy theory
#[derive(Debug, Default)]
pub struct PolicyStore {
    active: RwLock<Arc<Theory>>,
}

impl PolicyStore {
    /// Create a store with an empty theory
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new active theory, discarding the previous one entirely
    pub fn replace(&self, theory: Theory) {
        let mut guard = self
            .active
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Arc::new(theory);
    }

    /// Take a snapshot of the active theory
    ///
    /// The snapshot stays valid across later `replace` calls.
    pub fn snapshot(&self) -> Arc<Theory> {
        let guard = self
            .active
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_and_snapshot() {
        let store = PolicyStore::new();
        assert!(store.snapshot().is_empty());

        store.replace(Theory::parse("stmt(a).").unwrap());
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn test_snapshot_survives_replace() {
        let store = PolicyStore::new();
        store.replace(Theory::parse("stmt(a).").unwrap());
        let snapshot = store.snapshot();

        store.replace(Theory::parse("stmt(b). stmt(c).").unwrap());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.snapshot().len(), 2);
    }
}
