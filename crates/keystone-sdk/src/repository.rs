use std::fmt;
use std::sync::Arc;

use keystone_diff::{DiffEngine, DiffResult};
use keystone_facility::{FacilityReader, FacilityWriter, InMemoryFacility};
use keystone_ledger::{
    Author, ChangesSummary, Commit, CommitGraph, GraphValidator, InMemoryLedger, Ledger,
    NewCommit, ValidationReport, Version, VersionRef,
};
use keystone_refs::{
    AllowAll, Branch, BranchManager, BranchRepository, InMemoryBranchStore,
    PermissionChecker, ReviewApproval,
};
use keystone_rollback::{RollbackOptions, RollbackResult, RollbackService};
use keystone_snapshot::{InMemorySnapshotRepository, Snapshot, SnapshotBuilder, SnapshotRepository};
use keystone_store::{InMemoryObjectStore, ObjectStore};
use keystone_types::{BranchId, Clock, EntityId, RepositoryId, SystemClock};
use tracing::info;

use crate::commit::{CommitRequest, LogEntry};
use crate::config::EngineConfig;
use crate::error::SdkResult;

/// The storage and policy collaborators an engine runs on.
pub struct Backends {
    pub facility_reader: Arc<dyn FacilityReader>,
    pub facility_writer: Arc<dyn FacilityWriter>,
    pub store: Arc<dyn ObjectStore>,
    pub snapshots: Arc<dyn SnapshotRepository>,
    pub branches: Arc<dyn BranchRepository>,
    pub ledger: Arc<dyn Ledger>,
    pub permissions: Arc<dyn PermissionChecker>,
    pub clock: Arc<dyn Clock>,
}

impl Backends {
    /// In-memory backends over `facility`, allowing every merge.
    pub fn in_memory(facility: Arc<InMemoryFacility>) -> Self {
        let branches = Arc::new(InMemoryBranchStore::new());
        let ledger = Arc::new(InMemoryLedger::new(branches.clone()));
        Self {
            facility_reader: facility.clone(),
            facility_writer: facility,
            store: Arc::new(InMemoryObjectStore::new()),
            snapshots: Arc::new(InMemorySnapshotRepository::new()),
            branches,
            ledger,
            permissions: Arc::new(AllowAll),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_permissions(mut self, permissions: Arc<dyn PermissionChecker>) -> Self {
        self.permissions = permissions;
        self
    }
}

/// High-level Keystone API: snapshots, commits, branches, diff, and
/// rollback for the repositories of one facility backend.
pub struct Keystone {
    config: EngineConfig,
    facility: Arc<dyn FacilityReader>,
    ledger: Arc<dyn Ledger>,
    branches: BranchManager,
    builder: Arc<SnapshotBuilder>,
    graph: Arc<CommitGraph>,
    diff: Arc<DiffEngine>,
    rollback: RollbackService,
}

impl Keystone {
    pub fn new(config: EngineConfig, backends: Backends) -> SdkResult<Self> {
        config.validate()?;
        let Backends {
            facility_reader,
            facility_writer,
            store,
            snapshots,
            branches,
            ledger,
            permissions,
            clock,
        } = backends;

        let builder = Arc::new(SnapshotBuilder::new(
            facility_reader.clone(),
            store.clone(),
            snapshots.clone(),
            clock.clone(),
        ));
        let graph = Arc::new(
            CommitGraph::new(ledger.clone(), branches.clone(), clock.clone())
                .with_binding(config.commit_binding)
                .with_tag_prefix(config.version_tag_prefix.clone()),
        );
        let diff = Arc::new(DiffEngine::new(ledger.clone(), snapshots, store.clone()));
        let rollback = RollbackService::new(
            facility_reader.clone(),
            facility_writer,
            store,
            branches.clone(),
            diff.clone(),
            builder.clone(),
            graph.clone(),
        );

        Ok(Self {
            config,
            facility: facility_reader,
            ledger,
            branches: BranchManager::new(branches, permissions, clock),
            builder,
            graph,
            diff,
            rollback,
        })
    }

    /// An engine on in-memory backends over `facility`.
    pub fn in_memory(config: EngineConfig, facility: Arc<InMemoryFacility>) -> SdkResult<Self> {
        Self::new(config, Backends::in_memory(facility))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ---- Repository operations ----

    /// Prepare a repository for versioning.
    ///
    /// The first call creates and checks out the configured default branch;
    /// later calls return the checked-out branch.
    pub fn open_repository(&self, repository: &RepositoryId) -> SdkResult<Branch> {
        self.facility.repository(repository)?;
        if self.branches.repository().current(repository)?.is_some() {
            return Ok(self.branches.current_branch(repository)?);
        }
        let branch = self
            .branches
            .init_repository(repository, &self.config.default_branch)?;
        info!(repository = %repository, branch = %branch.name, "opened repository");
        Ok(branch)
    }

    pub fn capture_snapshot(&self, repository: &RepositoryId) -> SdkResult<Snapshot> {
        Ok(self.builder.capture_snapshot(repository)?)
    }

    // ---- Commit operations ----

    /// Capture the live building and commit it.
    pub fn commit(&self, repository: &RepositoryId, request: CommitRequest) -> SdkResult<Commit> {
        let snapshot = self.builder.capture_snapshot(repository)?;
        self.create_commit(repository, request, &snapshot)
    }

    /// Commit an already captured snapshot.
    ///
    /// The change summary is computed against the branch HEAD's snapshot.
    pub fn create_commit(
        &self,
        repository: &RepositoryId,
        request: CommitRequest,
        snapshot: &Snapshot,
    ) -> SdkResult<Commit> {
        let branch = match &request.branch {
            Some(name) => self.branches.get_branch(repository, name)?,
            None => self.branches.current_branch(repository)?,
        };
        let changes = self.changes_since_head(repository, &branch.id, snapshot)?;

        let mut new = NewCommit::new(branch.id, request.message, request.author);
        new.description = request.description;
        new.tags = request.tags;
        new.version_tag = request.version_tag;
        new.changes = changes;
        Ok(self.graph.create_commit(new, snapshot)?)
    }

    /// History of the checked-out branch, newest first.
    pub fn log(&self, repository: &RepositoryId, limit: Option<usize>) -> SdkResult<Vec<LogEntry>> {
        let branch = self.branches.current_branch(repository)?;
        Ok(self
            .graph
            .branch_history(&branch.id, limit)?
            .iter()
            .map(LogEntry::from)
            .collect())
    }

    /// Look up a commit by a unique hash prefix.
    pub fn show(&self, repository: &RepositoryId, prefix: &str) -> SdkResult<Commit> {
        Ok(self.graph.find_by_short_hash(repository, prefix)?)
    }

    pub fn versions(&self, repository: &RepositoryId) -> SdkResult<Vec<Version>> {
        Ok(self.graph.list_versions(repository)?)
    }

    pub fn resolve_version(&self, repository: &RepositoryId, reference: &VersionRef) -> SdkResult<Version> {
        Ok(self.graph.resolve_version(repository, reference)?)
    }

    /// Check the repository's commit graph for dangling parents, cycles,
    /// hash mismatches, and timestamp inversions.
    pub fn verify(&self, repository: &RepositoryId) -> SdkResult<ValidationReport> {
        Ok(GraphValidator::new(self.graph.binding()).validate(self.ledger.as_ref(), repository)?)
    }

    // ---- Branch operations ----

    pub fn create_branch(&self, repository: &RepositoryId, name: &str) -> SdkResult<Branch> {
        Ok(self.branches.create_branch(repository, name)?)
    }

    pub fn create_branch_from(&self, repository: &RepositoryId, name: &str, from: &str) -> SdkResult<Branch> {
        Ok(self.branches.create_branch_from(repository, name, from)?)
    }

    pub fn checkout_branch(&self, repository: &RepositoryId, name: &str) -> SdkResult<Branch> {
        Ok(self.branches.checkout_branch(repository, name)?)
    }

    pub fn current_branch(&self, repository: &RepositoryId) -> SdkResult<Branch> {
        Ok(self.branches.current_branch(repository)?)
    }

    pub fn branch(&self, repository: &RepositoryId, name: &str) -> SdkResult<Branch> {
        Ok(self.branches.get_branch(repository, name)?)
    }

    pub fn list_branches(&self, repository: &RepositoryId) -> SdkResult<Vec<Branch>> {
        Ok(self.branches.list_branches(repository)?)
    }

    pub fn delete_branch(&self, repository: &RepositoryId, name: &str) -> SdkResult<()> {
        Ok(self.branches.delete_branch(repository, name)?)
    }

    /// Merge `source` into `target` under a review approval.
    ///
    /// The live building is captured as the merged state and recorded as a
    /// two-parent commit on `target`; `source` is then marked merged. An
    /// empty `message` gets a generated one.
    pub fn merge_branch(
        &self,
        repository: &RepositoryId,
        source: &str,
        target: &str,
        approval: Option<ReviewApproval>,
        author: Author,
        message: &str,
    ) -> SdkResult<Commit> {
        let merge = self
            .branches
            .authorize_merge(repository, source, target, approval)?;
        let snapshot = self.builder.capture_snapshot(repository)?;
        let changes = self.changes_since_head(repository, &merge.target().id, &snapshot)?;
        let commit = self
            .graph
            .create_merge_commit(&merge, author, message, &snapshot, changes)?;
        self.branches.mark_merged(merge)?;
        Ok(commit)
    }

    // ---- Diff and rollback ----

    pub fn diff_versions(
        &self,
        repository: &RepositoryId,
        from: &VersionRef,
        to: &VersionRef,
    ) -> SdkResult<DiffResult> {
        Ok(self.diff.diff_versions(repository, from, to)?)
    }

    /// Default rollback options under this engine's configuration.
    pub fn rollback_options(&self) -> RollbackOptions {
        RollbackOptions {
            validate_after: self.config.validate_after_rollback,
            ..RollbackOptions::default()
        }
    }

    pub fn rollback(
        &self,
        building_id: &EntityId,
        target: &VersionRef,
        author: Author,
        options: &RollbackOptions,
    ) -> SdkResult<RollbackResult> {
        Ok(self.rollback.rollback(building_id, target, author, options)?)
    }

    fn changes_since_head(
        &self,
        repository: &RepositoryId,
        branch: &BranchId,
        snapshot: &Snapshot,
    ) -> SdkResult<ChangesSummary> {
        let head = match self.graph.head_version(branch)? {
            Some(v) => Some(self.diff.load_version(repository, &VersionRef::Id(v.id))?.1),
            None => None,
        };
        Ok(self.diff.diff_snapshots(head.as_ref(), snapshot)?.summary())
    }
}

impl fmt::Debug for Keystone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keystone")
            .field("default_branch", &self.config.default_branch)
            .field("commit_binding", &self.config.commit_binding)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use keystone_facility::testing::{eid, floor, seed_building, BUILDING_ID};
    use keystone_facility::{Category, EntityRecord, EntityWrite};
    use keystone_refs::{BranchStatus, DenyAll};
    use keystone_types::{ErrorKind, FixedClock};

    struct Fixture {
        facility: Arc<InMemoryFacility>,
        store: Arc<InMemoryObjectStore>,
        snapshots: Arc<InMemorySnapshotRepository>,
        ks: Keystone,
        repo: RepositoryId,
    }

    fn fixture_with(config: EngineConfig, permissions: Arc<dyn PermissionChecker>) -> Fixture {
        let facility = Arc::new(InMemoryFacility::new());
        let info = seed_building(&facility, 3);
        let store = Arc::new(InMemoryObjectStore::new());
        let snapshots = Arc::new(InMemorySnapshotRepository::new());
        let backends = Backends {
            store: store.clone(),
            snapshots: snapshots.clone(),
            ..Backends::in_memory(facility.clone())
        }
        .with_clock(Arc::new(FixedClock::epoch()))
        .with_permissions(permissions);
        let ks = Keystone::new(config, backends).unwrap();
        ks.open_repository(&info.id).unwrap();
        Fixture {
            facility,
            store,
            snapshots,
            ks,
            repo: info.id,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(EngineConfig::default(), Arc::new(AllowAll))
    }

    fn author() -> Author {
        Author::new("Ana", "ana@example.com", "u-1")
    }

    fn add_floor(f: &Fixture, id: &str, level: i32) {
        f.facility
            .apply(
                &eid(BUILDING_ID),
                EntityWrite::Upsert(EntityRecord::Floor(floor(id, BUILDING_ID, level))),
            )
            .unwrap();
    }

    fn floors(f: &Fixture) -> usize {
        f.facility.state(&eid(BUILDING_ID)).unwrap().count(Category::Floors)
    }

    fn approval(source: &str, target: &str) -> ReviewApproval {
        ReviewApproval {
            review_id: "PR-7".into(),
            approver: "u-2".into(),
            source_branch: source.into(),
            target_branch: target.into(),
        }
    }

    #[test]
    fn open_repository_is_idempotent() {
        let f = fixture();
        let first = f.ks.current_branch(&f.repo).unwrap();
        let again = f.ks.open_repository(&f.repo).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.name, "main");
        assert_eq!(f.ks.list_branches(&f.repo).unwrap().len(), 1);
    }

    #[test]
    fn open_unknown_repository_is_not_found() {
        let f = fixture();
        let err = f.ks.open_repository(&RepositoryId::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let facility = Arc::new(InMemoryFacility::new());
        let config = EngineConfig {
            version_tag_prefix: " ".into(),
            ..EngineConfig::default()
        };
        let err = Keystone::in_memory(config, facility).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }

    #[test]
    fn add_floor_then_roll_back() {
        let f = fixture();
        let c1 = f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        assert_eq!(c1.changes_summary.floors.added, 3);

        add_floor(&f, "floor-4", 4);
        let c2 = f.ks.commit(&f.repo, CommitRequest::new("Add level 4", author())).unwrap();
        assert_eq!(c2.changes_summary.floors.added, 1);
        assert_eq!(c2.changes_summary.total(), 1);

        let diff = f
            .ks
            .diff_versions(&f.repo, &VersionRef::Tag("v1".into()), &VersionRef::Tag("v2".into()))
            .unwrap();
        assert_eq!(diff.summary().floors.added, 1);
        assert_eq!(diff.floors.added[0].id().as_str(), "floor-4");

        let result = f
            .ks
            .rollback(
                &eid(BUILDING_ID),
                &VersionRef::Tag("v1".into()),
                author(),
                &f.ks.rollback_options(),
            )
            .unwrap();
        assert!(result.success);
        assert_eq!(result.changes.floors_restored, 1);
        assert!(result.validation.as_ref().is_some_and(|v| v.valid));
        assert_eq!(floors(&f), 3);

        let c3 = result.commit.unwrap();
        assert_eq!(c3.parent_commits, vec![c2.commit_hash]);
        assert_eq!(c3.snapshot_hash, c1.snapshot_hash);

        let versions = f.ks.versions(&f.repo).unwrap();
        let tags: Vec<&str> = versions.iter().map(|v| v.tag.as_str()).collect();
        assert_eq!(tags, ["v1", "v2", "v3"]);
        assert_eq!(versions[2].parent_hash, Some(c2.commit_hash));
        assert_eq!(versions[2].message, "Rollback to v1");
    }

    #[test]
    fn dry_run_changes_nothing() {
        let f = fixture();
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        add_floor(&f, "floor-4", 4);
        let head_before = f.ks.current_branch(&f.repo).unwrap().head_commit;
        let objects = f.store.all_hashes().unwrap();
        let snapshots = f.snapshots.list_by_repository(&f.repo).unwrap();

        let result = f
            .ks
            .rollback(
                &eid(BUILDING_ID),
                &VersionRef::Tag("v1".into()),
                author(),
                &RollbackOptions::dry_run(),
            )
            .unwrap();
        assert!(result.dry_run);
        assert_eq!(result.changes.floors_restored, 1);
        assert!(result.commit.is_none());

        assert_eq!(floors(&f), 4);
        assert_eq!(f.ks.versions(&f.repo).unwrap().len(), 1);
        assert_eq!(f.ks.current_branch(&f.repo).unwrap().head_commit, head_before);
        assert_eq!(f.store.all_hashes().unwrap(), objects);
        assert_eq!(f.snapshots.list_by_repository(&f.repo).unwrap(), snapshots);
    }

    #[test]
    fn custom_version_tag_does_not_block_later_commits() {
        let f = fixture();
        f.ks.commit(&f.repo, CommitRequest::new("Handover", author()).with_version_tag("v2"))
            .unwrap();
        add_floor(&f, "floor-4", 4);
        f.ks.commit(&f.repo, CommitRequest::new("Level 4", author())).unwrap();

        let result = f
            .ks
            .rollback(
                &eid(BUILDING_ID),
                &VersionRef::Tag("v2".into()),
                author(),
                &f.ks.rollback_options(),
            )
            .unwrap();
        assert!(result.success);
        assert!(result.commit.is_some());

        let tags: Vec<String> = f.ks.versions(&f.repo).unwrap().into_iter().map(|v| v.tag).collect();
        assert_eq!(tags, ["v2", "v3", "v4"]);
    }

    #[test]
    fn rollback_options_follow_config() {
        let config = EngineConfig {
            validate_after_rollback: false,
            ..EngineConfig::default()
        };
        let f = fixture_with(config, Arc::new(AllowAll));
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        let options = f.ks.rollback_options();
        assert!(!options.validate_after);
        let result = f
            .ks
            .rollback(&eid(BUILDING_ID), &VersionRef::Tag("v1".into()), author(), &options)
            .unwrap();
        assert!(result.validation.is_none());
    }

    #[test]
    fn custom_tag_prefix() {
        let config = EngineConfig {
            version_tag_prefix: "rev-".into(),
            ..EngineConfig::default()
        };
        let f = fixture_with(config, Arc::new(AllowAll));
        f.ks.commit(&f.repo, CommitRequest::new("one", author())).unwrap();
        let c = f
            .ks
            .commit(&f.repo, CommitRequest::new("two", author()).with_version_tag("handover"))
            .unwrap();
        let tags: Vec<String> = f.ks.versions(&f.repo).unwrap().into_iter().map(|v| v.tag).collect();
        assert_eq!(tags, ["rev-1", "handover"]);
        assert_eq!(
            f.ks.resolve_version(&f.repo, &VersionRef::Tag("handover".into())).unwrap().hash,
            c.commit_hash
        );
    }

    #[test]
    fn log_and_show() {
        let f = fixture();
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        add_floor(&f, "floor-4", 4);
        let c2 = f.ks.commit(&f.repo, CommitRequest::new("Add level 4", author())).unwrap();

        let log = f.ks.log(&f.repo, None).unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].message, "Add level 4");
        assert_eq!(log[0].short_hash, c2.short_hash);
        assert_eq!(log[0].author, "Ana <ana@example.com>");
        assert_eq!(log[1].parents, 0);
        assert_eq!(f.ks.log(&f.repo, Some(1)).unwrap().len(), 1);

        assert_eq!(f.ks.show(&f.repo, &c2.short_hash).unwrap(), c2);
    }

    #[test]
    fn commit_to_named_branch() {
        let f = fixture();
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        f.ks.create_branch(&f.repo, "plant").unwrap();
        add_floor(&f, "floor-4", 4);
        let c = f
            .ks
            .commit(&f.repo, CommitRequest::new("Plant room", author()).on_branch("plant"))
            .unwrap();
        assert_eq!(f.ks.branch(&f.repo, "plant").unwrap().head_commit, Some(c.commit_hash));
        assert_ne!(f.ks.branch(&f.repo, "main").unwrap().head_commit, Some(c.commit_hash));
        assert_eq!(f.ks.current_branch(&f.repo).unwrap().name, "main");
    }

    #[test]
    fn concurrent_commits_form_a_line() {
        let f = fixture();
        let ks = Arc::new(f.ks);
        let repo = f.repo;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ks = ks.clone();
                thread::spawn(move || loop {
                    match ks.commit(&repo, CommitRequest::new(format!("edit {i}"), author())) {
                        Ok(c) => break c,
                        Err(e) if e.kind() == ErrorKind::InvalidState => continue,
                        Err(e) => panic!("commit failed: {e}"),
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let branch = ks.current_branch(&repo).unwrap();
        let history = ks.graph.branch_history(&branch.id, None).unwrap();
        assert_eq!(history.len(), 8);
        for pair in history.windows(2) {
            assert_eq!(pair[0].parent_commits, vec![pair[1].commit_hash]);
        }
        assert!(history[7].is_root());
        assert_eq!(branch.head_commit, Some(history[0].commit_hash));
        assert!(ks.verify(&repo).unwrap().is_valid());
    }

    #[test]
    fn merge_requires_review() {
        let f = fixture();
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        f.ks.create_branch(&f.repo, "renovation").unwrap();
        f.ks.checkout_branch(&f.repo, "renovation").unwrap();
        add_floor(&f, "floor-4", 4);
        f.ks.commit(&f.repo, CommitRequest::new("Add level 4", author())).unwrap();

        let err = f
            .ks
            .merge_branch(&f.repo, "renovation", "main", None, author(), "")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(err.to_string(), "merge attempted outside review workflow");
        assert_eq!(f.ks.versions(&f.repo).unwrap().len(), 2);
    }

    #[test]
    fn merge_refused_without_permission() {
        let f = fixture_with(EngineConfig::default(), Arc::new(DenyAll));
        f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        f.ks.create_branch(&f.repo, "renovation").unwrap();
        f.ks
            .commit(&f.repo, CommitRequest::new("Survey fix", author()).on_branch("renovation"))
            .unwrap();
        let err = f
            .ks
            .merge_branch(
                &f.repo,
                "renovation",
                "main",
                Some(approval("renovation", "main")),
                author(),
                "",
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert!(f.ks.branch(&f.repo, "renovation").unwrap().is_active());
    }

    #[test]
    fn approved_merge() {
        let f = fixture();
        let base = f.ks.commit(&f.repo, CommitRequest::new("Initial survey", author())).unwrap();
        f.ks.create_branch(&f.repo, "renovation").unwrap();
        f.ks.checkout_branch(&f.repo, "renovation").unwrap();
        add_floor(&f, "floor-4", 4);
        let feature = f.ks.commit(&f.repo, CommitRequest::new("Add level 4", author())).unwrap();

        let merge = f
            .ks
            .merge_branch(
                &f.repo,
                "renovation",
                "main",
                Some(approval("renovation", "main")),
                author(),
                "",
            )
            .unwrap();
        assert!(merge.is_merge);
        assert_eq!(merge.parent_commits, vec![base.commit_hash, feature.commit_hash]);
        assert_eq!(merge.message, "Merge branch renovation into main");
        assert_eq!(merge.changes_summary.floors.added, 1);

        assert_eq!(f.ks.branch(&f.repo, "main").unwrap().head_commit, Some(merge.commit_hash));
        assert_eq!(
            f.ks.branch(&f.repo, "renovation").unwrap().status,
            BranchStatus::Merged
        );
        assert!(f.ks.verify(&f.repo).unwrap().is_valid());
    }

    #[test]
    fn debug_output_is_compact() {
        let f = fixture();
        let out = format!("{:?}", f.ks);
        assert!(out.starts_with("Keystone {"));
        assert!(out.contains("main"));
    }
}
