//! Mock catalog store for testing.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::catalog::{
    title_key, CatalogError, CatalogSession, CatalogShow, CatalogStore, CommitSummary,
};

#[derive(Debug, Default)]
struct CatalogState {
    shows: Vec<CatalogShow>,
    fail_next_begin: bool,
    fail_next_commit: bool,
    commit_attempts: usize,
}

/// In-memory implementation of the CatalogStore trait.
///
/// A session works on a snapshot of the committed shows; commit swaps the
/// snapshot in. Failures of `begin` and `commit` can be injected.
#[derive(Debug, Clone, Default)]
pub struct MockCatalogStore {
    state: Arc<RwLock<CatalogState>>,
}

impl MockCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a committed show directly.
    pub fn add_show(&self, show: CatalogShow) {
        self.write(|state| state.shows.push(show));
    }

    /// Committed shows in insertion order.
    pub fn shows(&self) -> Vec<CatalogShow> {
        self.read(|state| state.shows.clone())
    }

    /// Number of commit calls, failed ones included.
    pub fn commit_count(&self) -> usize {
        self.read(|state| state.commit_attempts)
    }

    /// Make the next `begin` fail.
    pub fn fail_next_begin(&self) {
        self.write(|state| state.fail_next_begin = true);
    }

    /// Make the next `commit` fail, discarding the session's changes.
    pub fn fail_next_commit(&self) {
        self.write(|state| state.fail_next_commit = true);
    }

    fn read<T>(&self, f: impl FnOnce(&CatalogState) -> T) -> T {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<T>(&self, f: impl FnOnce(&mut CatalogState) -> T) -> T {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl CatalogStore for MockCatalogStore {
    fn begin(&self) -> Result<Box<dyn CatalogSession>, CatalogError> {
        let working = self.write(|state| {
            if std::mem::take(&mut state.fail_next_begin) {
                Err(CatalogError::Database("mock begin failure".to_string()))
            } else {
                Ok(state.shows.clone())
            }
        })?;

        Ok(Box::new(MockSession {
            state: Arc::clone(&self.state),
            working,
            inserted: HashSet::new(),
            updated: HashSet::new(),
        }))
    }
}

struct MockSession {
    state: Arc<RwLock<CatalogState>>,
    working: Vec<CatalogShow>,
    inserted: HashSet<String>,
    updated: HashSet<String>,
}

impl CatalogSession for MockSession {
    fn find_by_title(&mut self, title: &str) -> Result<Option<CatalogShow>, CatalogError> {
        let key = title_key(title);
        Ok(self
            .working
            .iter()
            .filter(|show| show.title_key() == key)
            .min_by_key(|show| show.created_at)
            .cloned())
    }

    fn insert(&mut self, show: CatalogShow) -> Result<(), CatalogError> {
        if self.working.iter().any(|s| s.id == show.id) {
            return Err(CatalogError::Database(format!(
                "duplicate show id {}",
                show.id
            )));
        }
        self.inserted.insert(show.id.clone());
        self.working.push(show);
        Ok(())
    }

    fn update(&mut self, show: CatalogShow) -> Result<(), CatalogError> {
        let slot = self
            .working
            .iter_mut()
            .find(|s| s.id == show.id)
            .ok_or_else(|| CatalogError::NotFound(show.id.clone()))?;

        if !self.inserted.contains(&show.id) {
            self.updated.insert(show.id.clone());
        }
        *slot = show;
        Ok(())
    }

    fn pending(&self) -> usize {
        self.inserted.len() + self.updated.len()
    }

    fn commit(self: Box<Self>) -> Result<CommitSummary, CatalogError> {
        let MockSession {
            state,
            working,
            inserted,
            updated,
        } = *self;

        let mut state = state.write().unwrap_or_else(PoisonError::into_inner);
        state.commit_attempts += 1;
        if std::mem::take(&mut state.fail_next_commit) {
            return Err(CatalogError::Database("mock commit failure".to_string()));
        }

        state.shows = working;
        Ok(CommitSummary {
            inserted: inserted.len(),
            updated: updated.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_changes_visible_only_after_commit() {
        let store = MockCatalogStore::new();
        let mut session = store.begin().unwrap();
        session.insert(fixtures::catalog_show("Dark")).unwrap();

        assert!(session.find_by_title("DARK").unwrap().is_some());
        assert!(store.shows().is_empty());

        let summary = session.commit().unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(store.shows().len(), 1);
    }

    #[test]
    fn test_injected_failures_fire_once() {
        let store = MockCatalogStore::new();
        store.fail_next_begin();
        assert!(store.begin().is_err());
        assert!(store.begin().is_ok());

        store.fail_next_commit();
        let mut session = store.begin().unwrap();
        session.insert(fixtures::catalog_show("Lost")).unwrap();
        assert!(session.commit().is_err());
        assert!(store.shows().is_empty());
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_update_counts_only_committed_shows() {
        let store = MockCatalogStore::new();
        let existing = fixtures::catalog_show("Fargo");
        store.add_show(existing.clone());

        let mut session = store.begin().unwrap();
        let fresh = fixtures::catalog_show("Atlanta");
        session.insert(fresh.clone()).unwrap();
        session.update(fresh).unwrap();
        session.update(existing).unwrap();

        let summary = session.commit().unwrap();
        assert_eq!(summary.inserted, 1);
        assert_eq!(summary.updated, 1);
    }
}
