use std::collections::HashMap;
use std::sync::RwLock;

use keystone_types::{ObjectHash, RepositoryId};

use crate::error::{SnapshotError, SnapshotResult};
use crate::model::Snapshot;

/// Storage for snapshot records.
pub trait SnapshotRepository: Send + Sync {
    /// Persist a snapshot record.
    ///
    /// Idempotent per `(repository, hash)`: if the repository already holds a
    /// snapshot with this hash, the stored record is returned unchanged.
    fn create(&self, snapshot: &Snapshot) -> SnapshotResult<Snapshot>;

    fn get_by_hash(
        &self,
        repository: &RepositoryId,
        hash: &ObjectHash,
    ) -> SnapshotResult<Option<Snapshot>>;

    /// All snapshots of a repository, oldest first.
    fn list_by_repository(&self, repository: &RepositoryId) -> SnapshotResult<Vec<Snapshot>>;

    /// The most recently recorded snapshot of a repository.
    fn get_latest(&self, repository: &RepositoryId) -> SnapshotResult<Option<Snapshot>>;
}

/// In-memory [`SnapshotRepository`] keeping records in insertion order.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<HashMap<RepositoryId, Vec<Snapshot>>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> SnapshotError {
    SnapshotError::Backend(format!("lock poisoned: {e}"))
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn create(&self, snapshot: &Snapshot) -> SnapshotResult<Snapshot> {
        let mut map = self.snapshots.write().map_err(poisoned)?;
        let list = map.entry(snapshot.repository_id).or_default();
        if let Some(existing) = list.iter().find(|s| s.hash == snapshot.hash) {
            return Ok(existing.clone());
        }
        list.push(snapshot.clone());
        Ok(snapshot.clone())
    }

    fn get_by_hash(
        &self,
        repository: &RepositoryId,
        hash: &ObjectHash,
    ) -> SnapshotResult<Option<Snapshot>> {
        let map = self.snapshots.read().map_err(poisoned)?;
        Ok(map
            .get(repository)
            .and_then(|list| list.iter().find(|s| &s.hash == hash))
            .cloned())
    }

    fn list_by_repository(&self, repository: &RepositoryId) -> SnapshotResult<Vec<Snapshot>> {
        let map = self.snapshots.read().map_err(poisoned)?;
        Ok(map.get(repository).cloned().unwrap_or_default())
    }

    fn get_latest(&self, repository: &RepositoryId) -> SnapshotResult<Option<Snapshot>> {
        let map = self.snapshots.read().map_err(poisoned)?;
        Ok(map.get(repository).and_then(|list| list.last()).cloned())
    }
}
