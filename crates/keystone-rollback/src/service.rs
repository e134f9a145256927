use std::sync::Arc;
use std::time::{Duration, Instant};

use keystone_diff::{diff_states, DiffEngine, DiffResult};
use keystone_facility::{BuildingState, Category, EntityWrite, FacilityReader, FacilityWriter};
use keystone_ledger::{Author, Commit, CommitGraph, NewCommit, VersionRef, VersionSource};
use keystone_refs::BranchRepository;
use keystone_snapshot::{materialize, SnapshotBuilder};
use keystone_store::ObjectStore;
use keystone_types::EntityId;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::RollbackError;
use crate::options::RollbackOptions;
use crate::validate::{validate_state, ValidationResult};

// ---------------------------------------------------------------------------
// RollbackResult
// ---------------------------------------------------------------------------

/// Entities written per category. In a dry run, the writes that would be
/// issued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RestoredCounts {
    pub building_restored: bool,
    pub floors_restored: u64,
    pub rooms_restored: u64,
    pub equipment_restored: u64,
    pub points_restored: u64,
    /// Always zero; snapshots carry no files yet.
    pub files_restored: u64,
}

impl RestoredCounts {
    fn record(&mut self, category: Category) {
        match category {
            Category::Buildings => self.building_restored = true,
            Category::Floors => self.floors_restored += 1,
            Category::Rooms => self.rooms_restored += 1,
            Category::Equipment => self.equipment_restored += 1,
            Category::Points => self.points_restored += 1,
        }
    }

    fn tally(writes: &[EntityWrite]) -> Self {
        let mut counts = Self::default();
        for w in writes {
            counts.record(w.category());
        }
        counts
    }

    pub fn total(&self) -> u64 {
        u64::from(self.building_restored)
            + self.floors_restored
            + self.rooms_restored
            + self.equipment_restored
            + self.points_restored
            + self.files_restored
    }
}

/// The outcome of a rollback.
#[derive(Clone, Debug, Serialize)]
pub struct RollbackResult {
    /// `false` when the restore was cancelled part way.
    pub success: bool,
    pub dry_run: bool,
    /// From the branch HEAD version (or the empty state) to the target.
    pub diff: DiffResult,
    pub changes: RestoredCounts,
    /// Present when `validate_after` was set and the restore completed.
    pub validation: Option<ValidationResult>,
    /// The forward commit recording the restored state.
    pub commit: Option<Commit>,
    pub warnings: Vec<String>,
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// RollbackService
// ---------------------------------------------------------------------------

/// Restores a building's live state to a recorded version.
///
/// A rollback never rewrites history. The restored state is written to the
/// facility and, optionally, recorded as a new commit on top of the current
/// branch HEAD.
pub struct RollbackService {
    reader: Arc<dyn FacilityReader>,
    writer: Arc<dyn FacilityWriter>,
    store: Arc<dyn ObjectStore>,
    branches: Arc<dyn BranchRepository>,
    diff: Arc<DiffEngine>,
    builder: Arc<SnapshotBuilder>,
    graph: Arc<CommitGraph>,
}

impl RollbackService {
    pub fn new(
        reader: Arc<dyn FacilityReader>,
        writer: Arc<dyn FacilityWriter>,
        store: Arc<dyn ObjectStore>,
        branches: Arc<dyn BranchRepository>,
        diff: Arc<DiffEngine>,
        builder: Arc<SnapshotBuilder>,
        graph: Arc<CommitGraph>,
    ) -> Self {
        Self {
            reader,
            writer,
            store,
            branches,
            diff,
            builder,
            graph,
        }
    }

    /// Roll `building_id` back to `target`.
    ///
    /// Every lookup happens before the first write, so an unknown version
    /// or building fails with nothing changed. A failed write stops the
    /// restore and returns the error; writes already issued stay in place.
    /// Entity types are restored one after another, not atomically.
    pub fn rollback(
        &self,
        building_id: &EntityId,
        target: &VersionRef,
        author: Author,
        options: &RollbackOptions,
    ) -> Result<RollbackResult, RollbackError> {
        let started = Instant::now();

        let repo = self.reader.repository_for_building(building_id)?;
        let (target_version, target_snapshot) = self.diff.load_version(&repo.id, target)?;
        let branch_id = self
            .branches
            .current(&repo.id)?
            .ok_or(RollbackError::NoCurrentBranch)?;

        // HEAD -> target, reported to the caller.
        let head = self.graph.head_version(&branch_id)?;
        let head_snapshot = match &head {
            Some(v) => Some(self.diff.load_version(&repo.id, &VersionRef::Id(v.id))?.1),
            None => None,
        };
        let mut diff = self.diff.diff_snapshots(head_snapshot.as_ref(), &target_snapshot)?;
        diff.from_version = head.as_ref().map(|v| v.id);
        diff.to_version = Some(target_version.id);

        // live -> target, what actually gets written.
        let live = BuildingState::from_reader(self.reader.as_ref(), building_id)?;
        let restored = materialize(self.store.as_ref(), &target_snapshot)?;
        let plan = plan_writes(&diff_states(&live, &restored)?);

        if options.dry_run {
            info!(
                building = %building_id,
                target = %target_version.tag,
                writes = plan.len(),
                "rollback dry run"
            );
            return Ok(RollbackResult {
                success: true,
                dry_run: true,
                diff,
                changes: RestoredCounts::tally(&plan),
                validation: None,
                commit: None,
                warnings: Vec::new(),
                duration: started.elapsed(),
            });
        }

        let total = plan.len();
        let mut changes = RestoredCounts::default();
        for (done, write) in plan.into_iter().enumerate() {
            if options.cancel.is_cancelled() {
                let message = format!("rollback cancelled after {done} of {total} writes");
                warn!(building = %building_id, target = %target_version.tag, done, total, "rollback cancelled");
                return Ok(RollbackResult {
                    success: false,
                    dry_run: false,
                    diff,
                    changes,
                    validation: None,
                    commit: None,
                    warnings: vec![message],
                    duration: started.elapsed(),
                });
            }
            let category = write.category();
            self.writer.apply(building_id, write)?;
            changes.record(category);
        }

        let mut warnings = Vec::new();
        let validation = if options.validate_after {
            let result = validate_state(&BuildingState::from_reader(self.reader.as_ref(), building_id)?);
            if !result.valid {
                warn!(
                    building = %building_id,
                    errors = result.errors.len(),
                    "restored state failed validation"
                );
                warnings.push(format!(
                    "restored state has {} structural error(s)",
                    result.errors.len()
                ));
            }
            warnings.extend(result.warnings.iter().cloned());
            Some(result)
        } else {
            None
        };

        let commit = if options.create_version {
            let snapshot = self.builder.capture_snapshot(&repo.id)?;
            let message = options
                .message
                .clone()
                .unwrap_or_else(|| format!("Rollback to {}", target_version.tag));
            let mut request = NewCommit::new(branch_id, message, author);
            request.source = VersionSource::Rollback;
            request.changes = diff.summary();
            request.description = Some(format!(
                "Restored {} from version {}",
                building_id, target_version.tag
            ));
            Some(self.graph.create_commit(request, &snapshot)?)
        } else {
            None
        };

        info!(
            building = %building_id,
            target = %target_version.tag,
            writes = changes.total(),
            commit = commit.as_ref().map(|c| c.short_hash.as_str()).unwrap_or("-"),
            "rollback complete"
        );
        Ok(RollbackResult {
            success: true,
            dry_run: false,
            diff,
            changes,
            validation,
            commit,
            warnings,
            duration: started.elapsed(),
        })
    }
}

/// Order the writes that turn one state into another: upserts parent
/// before child, then deletes child before parent.
fn plan_writes(changes: &DiffResult) -> Vec<EntityWrite> {
    let mut writes = Vec::with_capacity(changes.total() as usize);
    for category in Category::ALL {
        let c = changes.get(category);
        writes.extend(c.added.iter().cloned().map(EntityWrite::Upsert));
        writes.extend(c.modified.iter().map(|m| EntityWrite::Upsert(m.after.clone())));
    }
    for category in Category::ALL.into_iter().rev() {
        writes.extend(changes.get(category).removed.iter().map(|r| EntityWrite::Delete {
            category,
            id: r.id().clone(),
        }));
    }
    writes
}
