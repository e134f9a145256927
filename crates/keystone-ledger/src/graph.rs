use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use keystone_refs::{AuthorizedMerge, Branch, BranchRepository, RefError};
use keystone_snapshot::Snapshot;
use keystone_types::{BranchId, Clock, CommitId, ObjectHash, RepositoryId, VersionId};
use tracing::info;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{
    commit_hash, Author, ChangesSummary, Commit, CommitBinding, Version, VersionMetadata,
    VersionRef, VersionSource,
};
use crate::traits::Ledger;

/// Shortest hash prefix accepted by [`CommitGraph::find_by_short_hash`].
pub const MIN_PREFIX_LEN: usize = 4;

/// A request to commit a captured snapshot to a branch.
#[derive(Clone, Debug)]
pub struct NewCommit {
    pub branch_id: BranchId,
    pub message: String,
    pub description: Option<String>,
    pub author: Author,
    pub tags: Vec<String>,
    /// Version tag; `None` assigns the next `<prefix><N>`.
    pub version_tag: Option<String>,
    pub source: VersionSource,
    pub changes: ChangesSummary,
}

impl NewCommit {
    pub fn new(branch_id: BranchId, message: impl Into<String>, author: Author) -> Self {
        Self {
            branch_id,
            message: message.into(),
            description: None,
            author,
            tags: Vec::new(),
            version_tag: None,
            source: VersionSource::Commit,
            changes: ChangesSummary::default(),
        }
    }
}

/// Records commits and answers history queries.
pub struct CommitGraph {
    ledger: Arc<dyn Ledger>,
    branches: Arc<dyn BranchRepository>,
    clock: Arc<dyn Clock>,
    binding: CommitBinding,
    tag_prefix: String,
}

impl CommitGraph {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        branches: Arc<dyn BranchRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            branches,
            clock,
            binding: CommitBinding::default(),
            tag_prefix: "v".into(),
        }
    }

    pub fn with_binding(mut self, binding: CommitBinding) -> Self {
        self.binding = binding;
        self
    }

    pub fn with_tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = prefix.into();
        self
    }

    pub fn binding(&self) -> CommitBinding {
        self.binding
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Commit `snapshot` to the request's branch.
    ///
    /// The branch's current HEAD becomes the sole parent (none for the first
    /// commit). The commit, its version, and the HEAD advance are persisted
    /// together; if another commit landed on the branch first, this fails
    /// with a stale-head error and writes nothing.
    pub fn create_commit(&self, request: NewCommit, snapshot: &Snapshot) -> LedgerResult<Commit> {
        if request.message.trim().is_empty() {
            return Err(LedgerError::InvalidRequest("commit message must not be empty".into()));
        }
        let branch = self.load_branch(&request.branch_id)?;
        if !branch.is_active() {
            return Err(LedgerError::InvalidState(
                "cannot commit to a non-active branch".into(),
            ));
        }
        if branch.repository_id != snapshot.repository_id {
            return Err(LedgerError::InvalidRequest(format!(
                "snapshot belongs to repository {}, branch {} to {}",
                snapshot.repository_id, branch.name, branch.repository_id
            )));
        }
        let parents: Vec<ObjectHash> = branch.head_commit.into_iter().collect();
        self.record(&branch, parents, request, snapshot, false)
    }

    /// Record a two-parent merge commit on the merge's target branch.
    ///
    /// Parents are the target's current HEAD followed by the source's.
    pub fn create_merge_commit(
        &self,
        merge: &AuthorizedMerge,
        author: Author,
        message: impl Into<String>,
        snapshot: &Snapshot,
        changes: ChangesSummary,
    ) -> LedgerResult<Commit> {
        let target = self.load_branch(&merge.target().id)?;
        let source = self.load_branch(&merge.source().id)?;
        let (Some(target_head), Some(source_head)) = (target.head_commit, source.head_commit) else {
            return Err(LedgerError::InvalidState(
                "both branches need commits to merge".into(),
            ));
        };
        if !target.is_active() {
            return Err(LedgerError::InvalidState(
                "cannot commit to a non-active branch".into(),
            ));
        }
        let message = message.into();
        let mut request = NewCommit::new(target.id, message, author);
        request.source = VersionSource::Merge;
        request.changes = changes;
        request.description = Some(format!(
            "Merge {} into {} (review {})",
            source.name,
            target.name,
            merge.approval().review_id
        ));
        if request.message.trim().is_empty() {
            request.message = format!("Merge branch {} into {}", source.name, target.name);
        }
        self.record(&target, vec![target_head, source_head], request, snapshot, true)
    }

    fn record(
        &self,
        branch: &Branch,
        parents: Vec<ObjectHash>,
        request: NewCommit,
        snapshot: &Snapshot,
        is_merge: bool,
    ) -> LedgerResult<Commit> {
        request.author.validate()?;
        let committed_at = self.commit_time(&parents)?;
        let tree_ref = self.binding.tree_ref(&snapshot.hash, &branch.id);
        let hash = commit_hash(&tree_ref, &parents, &request.author, &committed_at, &request.message);

        let tag = match request.version_tag {
            Some(tag) => tag,
            None => self.next_auto_tag(&branch.repository_id)?,
        };
        let version_id = VersionId::new();
        let version = Version {
            id: version_id,
            repository_id: branch.repository_id,
            tag,
            hash,
            snapshot_ref: snapshot.hash,
            parent_hash: parents.first().copied(),
            author: request.author.clone(),
            timestamp: committed_at,
            message: request.message.clone(),
            metadata: VersionMetadata {
                source: request.source,
                change_count: request.changes.total(),
            },
        };
        let commit = Commit {
            id: CommitId::new(),
            repository_id: branch.repository_id,
            branch_id: branch.id,
            version_id,
            commit_hash: hash,
            short_hash: hash.short_hex(),
            message: request.message,
            description: request.description,
            author: request.author,
            parent_commits: parents,
            is_merge,
            changes_summary: request.changes,
            tags: request.tags,
            committed_at,
            snapshot_hash: snapshot.hash,
        };

        self.ledger
            .append_commit(&commit, &version, branch.head_commit.as_ref())?;
        info!(
            branch = %branch.name,
            commit = %commit.short_hash,
            tag = %version.tag,
            source = %version.metadata.source,
            "created commit"
        );
        Ok(commit)
    }

    /// The clock's time, moved forward if needed so it is later than every
    /// parent's.
    fn commit_time(&self, parents: &[ObjectHash]) -> LedgerResult<DateTime<Utc>> {
        let mut at = self.clock.now();
        for parent in parents {
            if let Some(p) = self.ledger.get_commit(parent)? {
                if p.committed_at >= at {
                    at = p.committed_at + Duration::microseconds(1);
                }
            }
        }
        Ok(at)
    }

    /// First free `<prefix><N>`, counting up from the number of versions.
    fn next_auto_tag(&self, repository: &RepositoryId) -> LedgerResult<String> {
        let mut n = self.ledger.version_count(repository)? + 1;
        loop {
            let tag = format!("{}{}", self.tag_prefix, n);
            if self.ledger.get_version_by_tag(repository, &tag)?.is_none() {
                return Ok(tag);
            }
            n += 1;
        }
    }

    fn load_branch(&self, id: &BranchId) -> LedgerResult<Branch> {
        Ok(self
            .branches
            .get(id)?
            .ok_or_else(|| RefError::NotFound(id.to_string()))?)
    }

    // ---- lookups ----

    /// Look up a commit by its full hash.
    pub fn get_commit(&self, hash: &ObjectHash) -> LedgerResult<Commit> {
        self.ledger
            .get_commit(hash)?
            .ok_or_else(|| LedgerError::CommitNotFound(hash.to_hex()))
    }

    /// Look up a commit by a unique hash prefix.
    pub fn find_by_short_hash(&self, repository: &RepositoryId, prefix: &str) -> LedgerResult<Commit> {
        if prefix.len() < MIN_PREFIX_LEN || !prefix.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidRequest(format!(
                "{prefix:?} is not a hash prefix of at least {MIN_PREFIX_LEN} hex digits"
            )));
        }
        let mut matches = self.ledger.find_by_prefix(repository, prefix)?;
        match matches.len() {
            0 => Err(LedgerError::CommitNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            count => Err(LedgerError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                count,
            }),
        }
    }

    /// Resolve a version reference within a repository.
    pub fn resolve_version(&self, repository: &RepositoryId, reference: &VersionRef) -> LedgerResult<Version> {
        self.ledger.resolve(repository, reference)
    }

    /// The version recorded by a branch's HEAD commit, if any.
    pub fn head_version(&self, branch_id: &BranchId) -> LedgerResult<Option<Version>> {
        match self.load_branch(branch_id)?.head_commit {
            Some(head) => self.ledger.get_version_by_commit(&head),
            None => Ok(None),
        }
    }

    pub fn list_versions(&self, repository: &RepositoryId) -> LedgerResult<Vec<Version>> {
        self.ledger.list_versions(repository)
    }

    // ---- history ----

    /// Commits reachable from `from` through all parents, newest first.
    pub fn history(&self, from: &ObjectHash, limit: Option<usize>) -> LedgerResult<Vec<Commit>> {
        let mut commits = self.ancestors(from)?;
        commits.sort_by(|a, b| b.committed_at.cmp(&a.committed_at));
        if let Some(limit) = limit {
            commits.truncate(limit);
        }
        Ok(commits)
    }

    /// History of a branch from its HEAD.
    pub fn branch_history(&self, branch_id: &BranchId, limit: Option<usize>) -> LedgerResult<Vec<Commit>> {
        match self.load_branch(branch_id)?.head_commit {
            Some(head) => self.history(&head, limit),
            None => Ok(Vec::new()),
        }
    }

    /// Newest commit reachable from both `a` and `b`.
    pub fn merge_base(&self, a: &ObjectHash, b: &ObjectHash) -> LedgerResult<Option<Commit>> {
        let left: HashSet<ObjectHash> = self
            .ancestors(a)?
            .into_iter()
            .map(|c| c.commit_hash)
            .collect();
        Ok(self
            .ancestors(b)?
            .into_iter()
            .filter(|c| left.contains(&c.commit_hash))
            .max_by_key(|c| c.committed_at))
    }

    /// Breadth-first walk over every parent edge, including `from`.
    fn ancestors(&self, from: &ObjectHash) -> LedgerResult<Vec<Commit>> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([*from]);
        let mut out = Vec::new();
        while let Some(hash) = queue.pop_front() {
            if !seen.insert(hash) {
                continue;
            }
            let commit = self.get_commit(&hash)?;
            queue.extend(commit.parent_commits.iter().copied());
            out.push(commit);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryLedger;
    use keystone_refs::{AllowAll, BranchManager, InMemoryBranchStore, ReviewApproval};
    use keystone_snapshot::SnapshotMetadata;
    use keystone_types::{ErrorKind, FixedClock};

    struct Fixture {
        graph: CommitGraph,
        manager: BranchManager,
        repo: RepositoryId,
    }

    fn fixture_with(binding: CommitBinding) -> Fixture {
        let branches = Arc::new(InMemoryBranchStore::new());
        let clock = Arc::new(FixedClock::epoch());
        let ledger = Arc::new(InMemoryLedger::new(branches.clone()));
        let graph = CommitGraph::new(ledger, branches.clone(), clock.clone()).with_binding(binding);
        let manager = BranchManager::new(branches, Arc::new(AllowAll), clock);
        let repo = RepositoryId::new();
        manager.init_repository(&repo, "main").unwrap();
        Fixture {
            graph,
            manager,
            repo,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CommitBinding::Snapshot)
    }

    fn snapshot(repo: RepositoryId, b: u8) -> Snapshot {
        let h = ObjectHash::from_digest([b; 32]);
        Snapshot {
            repository_id: repo,
            hash: h,
            building_tree: h,
            equipment_tree: h,
            spatial_tree: h,
            files_tree: h,
            operations_tree: h,
            root_tree: h,
            metadata: SnapshotMetadata::default(),
            created_at: chrono::Utc::now(),
        }
    }

    fn author() -> Author {
        Author::new("Sam Okafor", "sam@example.com", "u-42")
    }

    fn commit_on(f: &Fixture, branch: &str, msg: &str, snap: u8) -> Commit {
        let b = f.manager.get_branch(&f.repo, branch).unwrap();
        f.graph
            .create_commit(NewCommit::new(b.id, msg, author()), &snapshot(f.repo, snap))
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Commit creation
    // -----------------------------------------------------------------------

    #[test]
    fn first_commit_is_root_and_moves_head() {
        let f = fixture();
        let c = commit_on(&f, "main", "Initial survey", 1);
        assert!(c.is_root());
        assert!(!c.is_merge);
        assert_eq!(c.short_hash, c.commit_hash.short_hex());
        assert_eq!(c.short_hash.len(), 7);
        let main = f.manager.get_branch(&f.repo, "main").unwrap();
        assert_eq!(main.head_commit, Some(c.commit_hash));
        assert_eq!(c.branch_id, main.id);
    }

    #[test]
    fn second_commit_has_previous_head_as_parent() {
        let f = fixture();
        let c1 = commit_on(&f, "main", "one", 1);
        let c2 = commit_on(&f, "main", "two", 2);
        assert_eq!(c2.parent_commits, vec![c1.commit_hash]);
        assert!(c2.committed_at > c1.committed_at);
    }

    #[test]
    fn versions_get_sequential_tags() {
        let f = fixture();
        let c1 = commit_on(&f, "main", "one", 1);
        let c2 = commit_on(&f, "main", "two", 2);
        let v1 = f.graph.resolve_version(&f.repo, &VersionRef::Tag("v1".into())).unwrap();
        let v2 = f.graph.resolve_version(&f.repo, &VersionRef::Tag("v2".into())).unwrap();
        assert_eq!(v1.hash, c1.commit_hash);
        assert_eq!(v2.parent_hash, Some(c1.commit_hash));
        assert_eq!(v2.id, c2.version_id);
        assert_eq!(v2.metadata.source, VersionSource::Commit);
    }

    #[test]
    fn explicit_tag_and_prefix() {
        let branches = Arc::new(InMemoryBranchStore::new());
        let ledger = Arc::new(InMemoryLedger::new(branches.clone()));
        let clock = Arc::new(FixedClock::epoch());
        let graph = CommitGraph::new(ledger, branches.clone(), clock.clone()).with_tag_prefix("rev-");
        let manager = BranchManager::new(branches, Arc::new(AllowAll), clock);
        let repo = RepositoryId::new();
        let main = manager.init_repository(&repo, "main").unwrap();

        graph
            .create_commit(NewCommit::new(main.id, "a", author()), &snapshot(repo, 1))
            .unwrap();
        let mut req = NewCommit::new(main.id, "b", author());
        req.version_tag = Some("handover".into());
        graph.create_commit(req, &snapshot(repo, 2)).unwrap();

        let tags: Vec<_> = graph
            .list_versions(&repo)
            .unwrap()
            .into_iter()
            .map(|v| v.tag)
            .collect();
        assert_eq!(tags, ["rev-1", "handover"]);
    }

    #[test]
    fn auto_tag_skips_taken_tags() {
        let f = fixture();
        let main = f.manager.get_branch(&f.repo, "main").unwrap();
        let mut req = NewCommit::new(main.id, "handover", author());
        req.version_tag = Some("v2".into());
        f.graph.create_commit(req, &snapshot(f.repo, 1)).unwrap();
        commit_on(&f, "main", "two", 2);
        commit_on(&f, "main", "three", 3);

        let tags: Vec<_> = f
            .graph
            .list_versions(&f.repo)
            .unwrap()
            .into_iter()
            .map(|v| v.tag)
            .collect();
        assert_eq!(tags, ["v2", "v3", "v4"]);
    }

    struct FrozenClock(chrono::DateTime<chrono::Utc>);

    impl Clock for FrozenClock {
        fn now(&self) -> chrono::DateTime<chrono::Utc> {
            self.0
        }
    }

    #[test]
    fn frozen_clock_still_orders_commits() {
        let branches = Arc::new(InMemoryBranchStore::new());
        let ledger = Arc::new(InMemoryLedger::new(branches.clone()));
        let clock = Arc::new(FrozenClock(chrono::Utc::now()));
        let graph = CommitGraph::new(ledger.clone(), branches.clone(), clock.clone());
        let manager = BranchManager::new(branches, Arc::new(AllowAll), clock);
        let repo = RepositoryId::new();
        let main = manager.init_repository(&repo, "main").unwrap();

        let c1 = graph
            .create_commit(NewCommit::new(main.id, "a", author()), &snapshot(repo, 1))
            .unwrap();
        let c2 = graph
            .create_commit(NewCommit::new(main.id, "b", author()), &snapshot(repo, 2))
            .unwrap();
        assert!(c2.committed_at > c1.committed_at);
        let report = crate::validation::verify_graph(ledger.as_ref(), &repo).unwrap();
        assert!(report.is_valid(), "{:?}", report.violations);
    }

    #[test]
    fn ambiguous_author_is_rejected() {
        let f = fixture();
        let main = f.manager.get_branch(&f.repo, "main").unwrap();
        let sneaky = Author::new("Sam <sam@example.com> u-42", "x@example.com", "u-1");
        let err = f
            .graph
            .create_commit(NewCommit::new(main.id, "a", sneaky), &snapshot(f.repo, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(f.graph.list_versions(&f.repo).unwrap().is_empty());
    }

    #[test]
    fn empty_message_is_config_error() {
        let f = fixture();
        let main = f.manager.get_branch(&f.repo, "main").unwrap();
        let err = f
            .graph
            .create_commit(NewCommit::new(main.id, "  ", author()), &snapshot(f.repo, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn closed_branch_refuses_commits() {
        let f = fixture();
        f.manager.create_branch(&f.repo, "old").unwrap();
        let closed = f.manager.close_branch(&f.repo, "old").unwrap();
        let err = f
            .graph
            .create_commit(NewCommit::new(closed.id, "late", author()), &snapshot(f.repo, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "cannot commit to a non-active branch");
    }

    #[test]
    fn hash_binds_to_snapshot_by_default() {
        let f = fixture();
        let c = commit_on(&f, "main", "one", 1);
        assert_eq!(c.recompute_hash(CommitBinding::Snapshot), c.commit_hash);
        assert_ne!(c.recompute_hash(CommitBinding::Branch), c.commit_hash);
    }

    #[test]
    fn legacy_branch_binding() {
        let f = fixture_with(CommitBinding::Branch);
        let c = commit_on(&f, "main", "one", 1);
        assert_eq!(c.recompute_hash(CommitBinding::Branch), c.commit_hash);
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    #[test]
    fn short_hash_lookup() {
        let f = fixture();
        let c = commit_on(&f, "main", "one", 1);
        assert_eq!(f.graph.find_by_short_hash(&f.repo, &c.short_hash).unwrap(), c);
        assert_eq!(
            f.graph.find_by_short_hash(&f.repo, "ab").unwrap_err().kind(),
            ErrorKind::Config
        );
        let missing = if c.short_hash.starts_with('0') { "ffff" } else { "0000" };
        assert_eq!(
            f.graph.find_by_short_hash(&f.repo, missing).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn unknown_version_is_not_found() {
        let f = fixture();
        let err = f
            .graph
            .resolve_version(&f.repo, &VersionRef::Tag("v9".into()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn version_from_other_repository_is_not_found() {
        let f = fixture();
        let c = commit_on(&f, "main", "one", 1);
        let err = f
            .graph
            .resolve_version(&RepositoryId::new(), &VersionRef::Id(c.version_id))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    // -----------------------------------------------------------------------
    // History, merge base, merges
    // -----------------------------------------------------------------------

    #[test]
    fn history_is_newest_first_and_limited() {
        let f = fixture();
        let c1 = commit_on(&f, "main", "one", 1);
        let c2 = commit_on(&f, "main", "two", 2);
        let c3 = commit_on(&f, "main", "three", 3);
        let main = f.manager.get_branch(&f.repo, "main").unwrap();

        let all: Vec<_> = f
            .graph
            .branch_history(&main.id, None)
            .unwrap()
            .into_iter()
            .map(|c| c.commit_hash)
            .collect();
        assert_eq!(all, [c3.commit_hash, c2.commit_hash, c1.commit_hash]);
        assert_eq!(f.graph.history(&c3.commit_hash, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn merge_commit_has_two_parents_and_base() {
        let f = fixture();
        let base = commit_on(&f, "main", "base", 1);
        f.manager.create_branch(&f.repo, "dev").unwrap();
        let on_dev = commit_on(&f, "dev", "dev work", 2);
        let on_main = commit_on(&f, "main", "main work", 3);

        assert_eq!(
            f.graph
                .merge_base(&on_dev.commit_hash, &on_main.commit_hash)
                .unwrap()
                .map(|c| c.commit_hash),
            Some(base.commit_hash)
        );

        let token = f
            .manager
            .authorize_merge(
                &f.repo,
                "dev",
                "main",
                Some(ReviewApproval {
                    review_id: "pr-1".into(),
                    approver: "lead".into(),
                    source_branch: "dev".into(),
                    target_branch: "main".into(),
                }),
            )
            .unwrap();
        let merge = f
            .graph
            .create_merge_commit(&token, author(), "", &snapshot(f.repo, 4), ChangesSummary::default())
            .unwrap();
        assert!(merge.is_merge);
        assert_eq!(merge.parent_commits, vec![on_main.commit_hash, on_dev.commit_hash]);
        assert_eq!(merge.message, "Merge branch dev into main");

        let version = f
            .graph
            .resolve_version(&f.repo, &VersionRef::Commit(merge.commit_hash))
            .unwrap();
        assert_eq!(version.metadata.source, VersionSource::Merge);
        // Both lines are in the merged history.
        assert_eq!(f.graph.history(&merge.commit_hash, None).unwrap().len(), 4);
    }
}
