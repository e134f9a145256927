use keystone_types::{ObjectHash, RepositoryId, VersionId};

use crate::error::{LedgerError, LedgerResult};
use crate::records::{Commit, Version, VersionRef};

/// Write boundary for the commit graph.
pub trait LedgerWriter: Send + Sync {
    /// Persist a commit and its version and advance the commit's branch.
    ///
    /// The branch HEAD moves from `expected_head` to `commit.commit_hash` in
    /// the same critical section that stores the records: either all three
    /// changes happen or none do. Fails without writing if HEAD has moved,
    /// a parent is missing, the hash is already stored, or the version tag
    /// is taken.
    fn append_commit(
        &self,
        commit: &Commit,
        version: &Version,
        expected_head: Option<&ObjectHash>,
    ) -> LedgerResult<()>;
}

/// Read boundary for the commit graph.
pub trait LedgerReader: Send + Sync {
    fn get_commit(&self, hash: &ObjectHash) -> LedgerResult<Option<Commit>>;

    /// Commits of a repository whose hex hash starts with `prefix`.
    fn find_by_prefix(&self, repository: &RepositoryId, prefix: &str) -> LedgerResult<Vec<Commit>>;

    /// All commits of a repository in append order.
    fn list_commits(&self, repository: &RepositoryId) -> LedgerResult<Vec<Commit>>;

    fn get_version(&self, id: &VersionId) -> LedgerResult<Option<Version>>;

    fn get_version_by_tag(&self, repository: &RepositoryId, tag: &str) -> LedgerResult<Option<Version>>;

    fn get_version_by_commit(&self, hash: &ObjectHash) -> LedgerResult<Option<Version>>;

    /// All versions of a repository in append order.
    fn list_versions(&self, repository: &RepositoryId) -> LedgerResult<Vec<Version>>;

    fn version_count(&self, repository: &RepositoryId) -> LedgerResult<u64> {
        Ok(self.list_versions(repository)?.len() as u64)
    }

    /// Resolve a version reference within `repository`.
    fn resolve(&self, repository: &RepositoryId, reference: &VersionRef) -> LedgerResult<Version> {
        let found = match reference {
            VersionRef::Id(id) => self.get_version(id)?,
            VersionRef::Tag(tag) => self.get_version_by_tag(repository, tag)?,
            VersionRef::Commit(hash) => self.get_version_by_commit(hash)?,
        };
        found
            .filter(|v| &v.repository_id == repository)
            .ok_or_else(|| LedgerError::VersionNotFound(reference.to_string()))
    }
}

/// Combined read/write ledger.
pub trait Ledger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> Ledger for T {}
