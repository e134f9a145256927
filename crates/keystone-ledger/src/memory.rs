use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keystone_refs::{BranchRepository, RefError};
use keystone_types::{ObjectHash, RepositoryId, VersionId};
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{Commit, Version};
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory commit graph for tests, local demos, and embedding.
///
/// Commits form an arena keyed by hash; parents are hash values. The branch
/// repository is shared with the branch manager so that HEAD advances
/// happen under this ledger's write lock.
pub struct InMemoryLedger {
    branches: Arc<dyn BranchRepository>,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    commits: HashMap<ObjectHash, Commit>,
    commit_order: HashMap<RepositoryId, Vec<ObjectHash>>,
    versions: HashMap<VersionId, Version>,
    version_order: HashMap<RepositoryId, Vec<VersionId>>,
    tag_index: HashMap<(RepositoryId, String), VersionId>,
    commit_versions: HashMap<ObjectHash, VersionId>,
}

impl LedgerState {
    /// Every check `append_commit` performs before mutating anything.
    fn check_append(&self, commit: &Commit, version: &Version) -> LedgerResult<()> {
        if self.commits.contains_key(&commit.commit_hash) {
            return Err(LedgerError::DuplicateCommit(commit.commit_hash));
        }
        if let Some(parent) = commit
            .parent_commits
            .iter()
            .find(|p| !self.commits.contains_key(p))
        {
            return Err(LedgerError::DanglingParent {
                commit: commit.commit_hash,
                parent: *parent,
            });
        }
        if version.hash != commit.commit_hash || version.id != commit.version_id {
            return Err(LedgerError::Integrity(format!(
                "version {} does not belong to commit {}",
                version.id, commit.commit_hash
            )));
        }
        if version.repository_id != commit.repository_id {
            return Err(LedgerError::Integrity(
                "commit and version belong to different repositories".into(),
            ));
        }
        if self
            .tag_index
            .contains_key(&(version.repository_id, version.tag.clone()))
        {
            return Err(LedgerError::DuplicateTag {
                tag: version.tag.clone(),
            });
        }
        Ok(())
    }
}

impl InMemoryLedger {
    pub fn new(branches: Arc<dyn BranchRepository>) -> Self {
        Self {
            branches,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    fn read_state(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.inner.read().map_err(LedgerError::poisoned)
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append_commit(
        &self,
        commit: &Commit,
        version: &Version,
        expected_head: Option<&ObjectHash>,
    ) -> LedgerResult<()> {
        let mut state = self.inner.write().map_err(LedgerError::poisoned)?;

        // Report a moved HEAD before anything else so that concurrent
        // writers always see the same failure.
        let branch = self
            .branches
            .get(&commit.branch_id)?
            .ok_or_else(|| RefError::NotFound(commit.branch_id.to_string()))?;
        if branch.head_commit.as_ref() != expected_head {
            return Err(RefError::StaleHead {
                branch: branch.name,
                expected: expected_head.copied(),
                actual: branch.head_commit,
            }
            .into());
        }
        state.check_append(commit, version)?;

        self.branches.compare_and_set_head(
            &commit.branch_id,
            expected_head,
            commit.commit_hash,
            commit.committed_at,
        )?;

        let hash = commit.commit_hash;
        let repo = commit.repository_id;
        state.commits.insert(hash, commit.clone());
        state.commit_order.entry(repo).or_default().push(hash);
        state.versions.insert(version.id, version.clone());
        state.version_order.entry(repo).or_default().push(version.id);
        state
            .tag_index
            .insert((repo, version.tag.clone()), version.id);
        state.commit_versions.insert(hash, version.id);

        debug!(
            commit = %commit.short_hash,
            parents = commit.parent_commits.len(),
            tag = %version.tag,
            "appended commit"
        );
        Ok(())
    }
}

impl LedgerReader for InMemoryLedger {
    fn get_commit(&self, hash: &ObjectHash) -> LedgerResult<Option<Commit>> {
        Ok(self.read_state()?.commits.get(hash).cloned())
    }

    fn find_by_prefix(&self, repository: &RepositoryId, prefix: &str) -> LedgerResult<Vec<Commit>> {
        let state = self.read_state()?;
        Ok(state
            .commit_order
            .get(repository)
            .into_iter()
            .flatten()
            .filter(|h| h.matches_prefix(prefix))
            .filter_map(|h| state.commits.get(h).cloned())
            .collect())
    }

    fn list_commits(&self, repository: &RepositoryId) -> LedgerResult<Vec<Commit>> {
        let state = self.read_state()?;
        Ok(state
            .commit_order
            .get(repository)
            .into_iter()
            .flatten()
            .filter_map(|h| state.commits.get(h).cloned())
            .collect())
    }

    fn get_version(&self, id: &VersionId) -> LedgerResult<Option<Version>> {
        Ok(self.read_state()?.versions.get(id).cloned())
    }

    fn get_version_by_tag(&self, repository: &RepositoryId, tag: &str) -> LedgerResult<Option<Version>> {
        let state = self.read_state()?;
        Ok(state
            .tag_index
            .get(&(*repository, tag.to_string()))
            .and_then(|id| state.versions.get(id))
            .cloned())
    }

    fn get_version_by_commit(&self, hash: &ObjectHash) -> LedgerResult<Option<Version>> {
        let state = self.read_state()?;
        Ok(state
            .commit_versions
            .get(hash)
            .and_then(|id| state.versions.get(id))
            .cloned())
    }

    fn list_versions(&self, repository: &RepositoryId) -> LedgerResult<Vec<Version>> {
        let state = self.read_state()?;
        Ok(state
            .version_order
            .get(repository)
            .into_iter()
            .flatten()
            .filter_map(|id| state.versions.get(id).cloned())
            .collect())
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.inner.read().map(|s| s.commits.len()).unwrap_or_default();
        f.debug_struct("InMemoryLedger")
            .field("commit_count", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::*;
    use chrono::{DateTime, TimeZone, Utc};
    use keystone_refs::{Branch, BranchStatus, InMemoryBranchStore};
    use keystone_types::{BranchId, CommitId, ErrorKind};

    struct Fixture {
        ledger: InMemoryLedger,
        branches: Arc<InMemoryBranchStore>,
        repo: RepositoryId,
        main: BranchId,
    }

    fn fixture() -> Fixture {
        let branches = Arc::new(InMemoryBranchStore::new());
        let repo = RepositoryId::new();
        let now = Utc::now();
        let main = Branch {
            id: BranchId::new(),
            repository_id: repo,
            name: "main".into(),
            head_commit: None,
            status: BranchStatus::Active,
            is_default: true,
            created_from: None,
            created_at: now,
            updated_at: now,
        };
        branches.create(&main).unwrap();
        Fixture {
            ledger: InMemoryLedger::new(branches.clone()),
            branches,
            repo,
            main: main.id,
        }
    }

    fn at(second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, second).unwrap()
    }

    fn records(
        f: &Fixture,
        parents: Vec<ObjectHash>,
        tag: &str,
        second: u32,
    ) -> (Commit, Version) {
        let author = Author::new("Ops", "ops@example.com", "u-1");
        let snapshot = ObjectHash::from_digest([second as u8; 32]);
        let hash = commit_hash(&snapshot.to_hex(), &parents, &author, &at(second), tag);
        let version_id = VersionId::new();
        let commit = Commit {
            id: CommitId::new(),
            repository_id: f.repo,
            branch_id: f.main,
            version_id,
            commit_hash: hash,
            short_hash: hash.short_hex(),
            message: tag.into(),
            description: None,
            author: author.clone(),
            parent_commits: parents.clone(),
            is_merge: parents.len() > 1,
            changes_summary: ChangesSummary::default(),
            tags: vec![],
            committed_at: at(second),
            snapshot_hash: snapshot,
        };
        let version = Version {
            id: version_id,
            repository_id: f.repo,
            tag: tag.into(),
            hash,
            snapshot_ref: snapshot,
            parent_hash: parents.first().copied(),
            author,
            timestamp: at(second),
            message: tag.into(),
            metadata: VersionMetadata {
                source: VersionSource::Commit,
                change_count: 0,
            },
        };
        (commit, version)
    }

    fn head(f: &Fixture) -> Option<ObjectHash> {
        f.branches.get(&f.main).unwrap().unwrap().head_commit
    }

    #[test]
    fn append_stores_and_advances_head() {
        let f = fixture();
        let (c1, v1) = records(&f, vec![], "v1", 1);
        f.ledger.append_commit(&c1, &v1, None).unwrap();

        assert_eq!(head(&f), Some(c1.commit_hash));
        assert_eq!(f.ledger.get_commit(&c1.commit_hash).unwrap(), Some(c1.clone()));
        assert_eq!(f.ledger.get_version_by_tag(&f.repo, "v1").unwrap(), Some(v1.clone()));
        assert_eq!(f.ledger.get_version_by_commit(&c1.commit_hash).unwrap(), Some(v1));

        let (c2, v2) = records(&f, vec![c1.commit_hash], "v2", 2);
        f.ledger.append_commit(&c2, &v2, Some(&c1.commit_hash)).unwrap();
        assert_eq!(head(&f), Some(c2.commit_hash));
        assert_eq!(f.ledger.list_commits(&f.repo).unwrap().len(), 2);
        assert_eq!(f.ledger.version_count(&f.repo).unwrap(), 2);
    }

    #[test]
    fn stale_head_writes_nothing() {
        let f = fixture();
        let (c1, v1) = records(&f, vec![], "v1", 1);
        f.ledger.append_commit(&c1, &v1, None).unwrap();

        let (c2, v2) = records(&f, vec![], "v2", 2);
        let err = f.ledger.append_commit(&c2, &v2, None).unwrap_err();
        assert!(matches!(err, LedgerError::Ref(RefError::StaleHead { .. })));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(f.ledger.get_commit(&c2.commit_hash).unwrap().is_none());
        assert!(f.ledger.get_version_by_tag(&f.repo, "v2").unwrap().is_none());
        assert_eq!(head(&f), Some(c1.commit_hash));
    }

    #[test]
    fn dangling_parent_leaves_head_alone() {
        let f = fixture();
        let ghost = ObjectHash::from_digest([0xee; 32]);
        let (c, v) = records(&f, vec![ghost], "v1", 1);
        let err = f.ledger.append_commit(&c, &v, None).unwrap_err();
        assert!(matches!(err, LedgerError::DanglingParent { parent, .. } if parent == ghost));
        assert!(head(&f).is_none());
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let f = fixture();
        let (c1, v1) = records(&f, vec![], "v1", 1);
        f.ledger.append_commit(&c1, &v1, None).unwrap();
        let (c2, mut v2) = records(&f, vec![c1.commit_hash], "v2", 2);
        v2.tag = "v1".into();
        let err = f
            .ledger
            .append_commit(&c2, &v2, Some(&c1.commit_hash))
            .unwrap_err();
        assert!(matches!(err, LedgerError::DuplicateTag { .. }));
        assert_eq!(head(&f), Some(c1.commit_hash));
    }

    #[test]
    fn find_by_prefix_scopes_to_repository() {
        let f = fixture();
        let (c1, v1) = records(&f, vec![], "v1", 1);
        f.ledger.append_commit(&c1, &v1, None).unwrap();
        let found = f.ledger.find_by_prefix(&f.repo, &c1.short_hash).unwrap();
        assert_eq!(found.len(), 1);
        assert!(f
            .ledger
            .find_by_prefix(&RepositoryId::new(), &c1.short_hash)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn concurrent_appends_on_one_head_have_one_winner() {
        use std::thread;

        let f = Arc::new(fixture());
        let handles: Vec<_> = (1..=6u32)
            .map(|i| {
                let f = Arc::clone(&f);
                thread::spawn(move || {
                    let (c, v) = records(&f, vec![], &format!("t{i}"), i);
                    f.ledger.append_commit(&c, &v, None).map(|_| c.commit_hash)
                })
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(winners.len(), 1);
        assert_eq!(head(&f), Some(*winners[0]));
        assert_eq!(f.ledger.list_commits(&f.repo).unwrap().len(), 1);
    }
}
