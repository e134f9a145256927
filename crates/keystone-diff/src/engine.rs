use std::sync::Arc;

use keystone_facility::Category;
use keystone_ledger::{Ledger, Version, VersionRef};
use keystone_snapshot::{category_hash, load_category, Snapshot, SnapshotRepository};
use keystone_store::ObjectStore;
use keystone_types::RepositoryId;
use tracing::debug;

use crate::changes::DiffResult;
use crate::error::DiffError;
use crate::state_diff::diff_records;

/// Computes entity-level diffs between recorded versions.
pub struct DiffEngine {
    ledger: Arc<dyn Ledger>,
    snapshots: Arc<dyn SnapshotRepository>,
    store: Arc<dyn ObjectStore>,
}

impl DiffEngine {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        snapshots: Arc<dyn SnapshotRepository>,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            ledger,
            snapshots,
            store,
        }
    }

    /// Resolve a version and the snapshot it recorded.
    pub fn load_version(
        &self,
        repository: &RepositoryId,
        reference: &VersionRef,
    ) -> Result<(Version, Snapshot), DiffError> {
        let version = self.ledger.resolve(repository, reference)?;
        let snapshot = self
            .snapshots
            .get_by_hash(repository, &version.snapshot_ref)?
            .ok_or_else(|| DiffError::SnapshotMissing {
                version: version.tag.clone(),
                snapshot: version.snapshot_ref,
            })?;
        Ok((version, snapshot))
    }

    /// Changes that turn version `from` into version `to`.
    pub fn diff_versions(
        &self,
        repository: &RepositoryId,
        from: &VersionRef,
        to: &VersionRef,
    ) -> Result<DiffResult, DiffError> {
        let (from_version, from_snapshot) = self.load_version(repository, from)?;
        let (to_version, to_snapshot) = self.load_version(repository, to)?;
        let mut diff = self.diff_snapshots(Some(&from_snapshot), &to_snapshot)?;
        diff.from_version = Some(from_version.id);
        diff.to_version = Some(to_version.id);
        debug!(
            from = %from_version.tag,
            to = %to_version.tag,
            changes = diff.total(),
            "diffed versions"
        );
        Ok(diff)
    }

    /// Changes between two snapshots; `None` stands for the empty state.
    ///
    /// A category whose subtree hash is equal on both sides is skipped
    /// without reading any of its entities.
    pub fn diff_snapshots(&self, from: Option<&Snapshot>, to: &Snapshot) -> Result<DiffResult, DiffError> {
        let store = self.store.as_ref();
        let mut diff = DiffResult::default();
        for category in Category::ALL {
            let old = match from {
                Some(from) => {
                    if category_hash(store, from, category)? == category_hash(store, to, category)? {
                        debug!(category = %category, "subtree unchanged, skipping");
                        continue;
                    }
                    load_category(store, from, category)?
                }
                None => Vec::new(),
            };
            let new = load_category(store, to, category)?;
            *diff.get_mut(category) = diff_records(&old, &new)?;
        }
        Ok(diff)
    }
}

impl std::fmt::Debug for DiffEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffEngine").finish_non_exhaustive()
    }
}
