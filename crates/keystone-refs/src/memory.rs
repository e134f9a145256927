//! In-memory branch store for testing and embedding.
//!
//! [`InMemoryBranchStore`] keeps branches in a `HashMap` behind a `RwLock`
//! and the per-repository checked-out pointer in a second map. Every method
//! takes the branch lock once, so a compare-and-swap on HEAD cannot
//! interleave with another update of the same branch.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use keystone_types::{BranchId, ObjectHash, RepositoryId};
use tracing::debug;

use crate::error::{RefError, RefResult};
use crate::traits::BranchRepository;
use crate::types::{Branch, BranchStatus};

/// An in-memory implementation of [`BranchRepository`].
#[derive(Debug, Default)]
pub struct InMemoryBranchStore {
    branches: RwLock<HashMap<BranchId, Branch>>,
    current: RwLock<HashMap<RepositoryId, BranchId>>,
}

impl InMemoryBranchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(id: &BranchId) -> RefError {
    RefError::NotFound(id.to_string())
}

impl BranchRepository for InMemoryBranchStore {
    fn create(&self, branch: &Branch) -> RefResult<()> {
        let mut map = self.branches.write().map_err(RefError::poisoned)?;
        for existing in map.values().filter(|b| b.repository_id == branch.repository_id) {
            if existing.name == branch.name {
                return Err(RefError::AlreadyExists {
                    name: branch.name.clone(),
                });
            }
            if branch.is_default && existing.is_default {
                return Err(RefError::InvalidState(format!(
                    "repository {} already has a default branch",
                    branch.repository_id
                )));
            }
        }
        map.insert(branch.id, branch.clone());
        Ok(())
    }

    fn get(&self, id: &BranchId) -> RefResult<Option<Branch>> {
        let map = self.branches.read().map_err(RefError::poisoned)?;
        Ok(map.get(id).cloned())
    }

    fn get_by_name(&self, repository: &RepositoryId, name: &str) -> RefResult<Option<Branch>> {
        let map = self.branches.read().map_err(RefError::poisoned)?;
        Ok(map
            .values()
            .find(|b| &b.repository_id == repository && b.name == name)
            .cloned())
    }

    fn list(&self, repository: &RepositoryId) -> RefResult<Vec<Branch>> {
        let map = self.branches.read().map_err(RefError::poisoned)?;
        let mut out: Vec<Branch> = map
            .values()
            .filter(|b| &b.repository_id == repository)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    fn compare_and_set_head(
        &self,
        id: &BranchId,
        expected: Option<&ObjectHash>,
        new: ObjectHash,
        at: DateTime<Utc>,
    ) -> RefResult<Branch> {
        let mut map = self.branches.write().map_err(RefError::poisoned)?;
        let branch = map.get_mut(id).ok_or_else(|| missing(id))?;
        if !branch.is_active() {
            return Err(RefError::InvalidState(
                "cannot commit to a non-active branch".into(),
            ));
        }
        if branch.head_commit.as_ref() != expected {
            return Err(RefError::StaleHead {
                branch: branch.name.clone(),
                expected: expected.copied(),
                actual: branch.head_commit,
            });
        }
        branch.head_commit = Some(new);
        branch.updated_at = at;
        debug!(branch = %branch.name, head = %new.short_hex(), "advanced head");
        Ok(branch.clone())
    }

    fn update_status(
        &self,
        id: &BranchId,
        status: BranchStatus,
        at: DateTime<Utc>,
    ) -> RefResult<Branch> {
        let mut map = self.branches.write().map_err(RefError::poisoned)?;
        let branch = map.get_mut(id).ok_or_else(|| missing(id))?;
        branch.status = status;
        branch.updated_at = at;
        Ok(branch.clone())
    }

    fn set_default(
        &self,
        repository: &RepositoryId,
        id: &BranchId,
        at: DateTime<Utc>,
    ) -> RefResult<Branch> {
        let mut map = self.branches.write().map_err(RefError::poisoned)?;
        match map.get(id) {
            Some(b) if &b.repository_id == repository => {}
            _ => return Err(missing(id)),
        }
        for branch in map.values_mut().filter(|b| &b.repository_id == repository) {
            let is_target = &branch.id == id;
            if branch.is_default != is_target {
                branch.is_default = is_target;
                branch.updated_at = at;
            }
        }
        map.get(id).cloned().ok_or_else(|| missing(id))
    }

    fn delete(&self, id: &BranchId) -> RefResult<bool> {
        let mut map = self.branches.write().map_err(RefError::poisoned)?;
        Ok(map.remove(id).is_some())
    }

    fn current(&self, repository: &RepositoryId) -> RefResult<Option<BranchId>> {
        let current = self.current.read().map_err(RefError::poisoned)?;
        Ok(current.get(repository).copied())
    }

    fn set_current(&self, repository: &RepositoryId, id: &BranchId) -> RefResult<()> {
        let mut current = self.current.write().map_err(RefError::poisoned)?;
        current.insert(*repository, *id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn branch(repo: RepositoryId, name: &str, is_default: bool) -> Branch {
        let now = Utc::now();
        Branch {
            id: BranchId::new(),
            repository_id: repo,
            name: name.into(),
            head_commit: None,
            status: BranchStatus::Active,
            is_default,
            created_from: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn h(b: u8) -> ObjectHash {
        ObjectHash::from_digest([b; 32])
    }

    // -----------------------------------------------------------------------
    // Create / lookup
    // -----------------------------------------------------------------------

    #[test]
    fn create_and_lookup() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        let main = branch(repo, "main", true);
        store.create(&main).unwrap();

        assert_eq!(store.get(&main.id).unwrap(), Some(main.clone()));
        assert_eq!(store.get_by_name(&repo, "main").unwrap(), Some(main));
        assert!(store.get_by_name(&RepositoryId::new(), "main").unwrap().is_none());
    }

    #[test]
    fn names_unique_per_repository() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        store.create(&branch(repo, "main", true)).unwrap();
        assert!(matches!(
            store.create(&branch(repo, "main", false)),
            Err(RefError::AlreadyExists { .. })
        ));
        // Another repository may reuse the name.
        store.create(&branch(RepositoryId::new(), "main", true)).unwrap();
    }

    #[test]
    fn second_default_is_rejected() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        store.create(&branch(repo, "main", true)).unwrap();
        assert!(matches!(
            store.create(&branch(repo, "other", true)),
            Err(RefError::InvalidState(_))
        ));
    }

    #[test]
    fn list_sorted_by_name() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        for name in ["zeta", "main", "alpha"] {
            store.create(&branch(repo, name, name == "main")).unwrap();
        }
        let names: Vec<_> = store.list(&repo).unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["alpha", "main", "zeta"]);
    }

    // -----------------------------------------------------------------------
    // HEAD compare-and-swap
    // -----------------------------------------------------------------------

    #[test]
    fn cas_advances_from_expected_head() {
        let store = InMemoryBranchStore::new();
        let main = branch(RepositoryId::new(), "main", true);
        store.create(&main).unwrap();

        let b = store.compare_and_set_head(&main.id, None, h(1), Utc::now()).unwrap();
        assert_eq!(b.head_commit, Some(h(1)));
        let b = store
            .compare_and_set_head(&main.id, Some(&h(1)), h(2), Utc::now())
            .unwrap();
        assert_eq!(b.head_commit, Some(h(2)));
    }

    #[test]
    fn cas_rejects_stale_expectation() {
        let store = InMemoryBranchStore::new();
        let main = branch(RepositoryId::new(), "main", true);
        store.create(&main).unwrap();
        store.compare_and_set_head(&main.id, None, h(1), Utc::now()).unwrap();

        let err = store
            .compare_and_set_head(&main.id, None, h(2), Utc::now())
            .unwrap_err();
        assert!(matches!(err, RefError::StaleHead { actual: Some(a), .. } if a == h(1)));
        assert_eq!(store.get(&main.id).unwrap().unwrap().head_commit, Some(h(1)));
    }

    #[test]
    fn cas_rejects_inactive_branch() {
        let store = InMemoryBranchStore::new();
        let topic = branch(RepositoryId::new(), "topic", false);
        store.create(&topic).unwrap();
        store
            .update_status(&topic.id, BranchStatus::Closed, Utc::now())
            .unwrap();
        assert!(matches!(
            store.compare_and_set_head(&topic.id, None, h(1), Utc::now()),
            Err(RefError::InvalidState(_))
        ));
    }

    #[test]
    fn concurrent_cas_from_same_head_has_one_winner() {
        use std::thread;

        let store = Arc::new(InMemoryBranchStore::new());
        let main = branch(RepositoryId::new(), "main", true);
        store.create(&main).unwrap();

        let handles: Vec<_> = (1..=8u8)
            .map(|i| {
                let store = Arc::clone(&store);
                let id = main.id;
                thread::spawn(move || store.compare_and_set_head(&id, None, h(i), Utc::now()))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, RefError::StaleHead { .. })));
    }

    // -----------------------------------------------------------------------
    // Default / current / delete
    // -----------------------------------------------------------------------

    #[test]
    fn set_default_moves_the_flag() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        let main = branch(repo, "main", true);
        let dev = branch(repo, "dev", false);
        store.create(&main).unwrap();
        store.create(&dev).unwrap();

        store.set_default(&repo, &dev.id, Utc::now()).unwrap();
        let defaults: Vec<_> = store
            .list(&repo)
            .unwrap()
            .into_iter()
            .filter(|b| b.is_default)
            .map(|b| b.name)
            .collect();
        assert_eq!(defaults, ["dev"]);
    }

    #[test]
    fn set_default_rejects_foreign_branch() {
        let store = InMemoryBranchStore::new();
        let other = branch(RepositoryId::new(), "main", true);
        store.create(&other).unwrap();
        assert!(matches!(
            store.set_default(&RepositoryId::new(), &other.id, Utc::now()),
            Err(RefError::NotFound(_))
        ));
    }

    #[test]
    fn current_pointer_and_delete() {
        let store = InMemoryBranchStore::new();
        let repo = RepositoryId::new();
        let main = branch(repo, "main", true);
        store.create(&main).unwrap();

        assert!(store.current(&repo).unwrap().is_none());
        store.set_current(&repo, &main.id).unwrap();
        assert_eq!(store.current(&repo).unwrap(), Some(main.id));

        assert!(store.delete(&main.id).unwrap());
        assert!(!store.delete(&main.id).unwrap());
    }
}
