//! Whole-graph integrity checks.
//!
//! The write path refuses dangling parents and duplicate hashes, so a graph
//! built only through [`CommitGraph`](crate::CommitGraph) passes every check
//! here. The validator exists for imported or externally edited histories.

use std::collections::{HashMap, HashSet};
use std::fmt;

use keystone_types::{ObjectHash, RepositoryId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LedgerResult;
use crate::records::{Commit, CommitBinding};
use crate::traits::LedgerReader;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    DanglingParent,
    /// A commit is not strictly newer than one of its parents.
    TemporalOrder,
    HashMismatch,
    Cycle,
    /// A commit without a version, or a version whose commit is missing.
    OrphanVersion,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DanglingParent => "dangling parent",
            Self::TemporalOrder => "temporal order",
            Self::HashMismatch => "hash mismatch",
            Self::Cycle => "cycle",
            Self::OrphanVersion => "orphan version",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub commit: ObjectHash,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub repository: RepositoryId,
    pub commit_count: usize,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn count(&self, kind: ViolationKind) -> usize {
        self.violations.iter().filter(|v| v.kind == kind).count()
    }
}

/// Checks a repository's commit graph against its structural invariants.
#[derive(Clone, Copy, Debug, Default)]
pub struct GraphValidator {
    binding: CommitBinding,
}

impl GraphValidator {
    pub fn new(binding: CommitBinding) -> Self {
        Self { binding }
    }

    pub fn validate<R: LedgerReader + ?Sized>(
        &self,
        reader: &R,
        repository: &RepositoryId,
    ) -> LedgerResult<ValidationReport> {
        let commits = reader.list_commits(repository)?;
        let by_hash: HashMap<ObjectHash, &Commit> =
            commits.iter().map(|c| (c.commit_hash, c)).collect();
        let mut violations = Vec::new();

        for commit in &commits {
            let recomputed = commit.recompute_hash(self.binding);
            if recomputed != commit.commit_hash {
                violations.push(Violation {
                    commit: commit.commit_hash,
                    kind: ViolationKind::HashMismatch,
                    description: format!("content hashes to {recomputed}"),
                });
            }
            for parent in &commit.parent_commits {
                match by_hash.get(parent) {
                    None => violations.push(Violation {
                        commit: commit.commit_hash,
                        kind: ViolationKind::DanglingParent,
                        description: format!("parent {} is not stored", parent.short_hex()),
                    }),
                    Some(p) if p.committed_at >= commit.committed_at => {
                        violations.push(Violation {
                            commit: commit.commit_hash,
                            kind: ViolationKind::TemporalOrder,
                            description: format!(
                                "committed at {} but parent {} at {}",
                                commit.committed_at,
                                parent.short_hex(),
                                p.committed_at
                            ),
                        })
                    }
                    Some(_) => {}
                }
            }
            if reader.get_version_by_commit(&commit.commit_hash)?.is_none() {
                violations.push(Violation {
                    commit: commit.commit_hash,
                    kind: ViolationKind::OrphanVersion,
                    description: "commit has no version".into(),
                });
            }
        }

        for version in reader.list_versions(repository)? {
            if !by_hash.contains_key(&version.hash) {
                violations.push(Violation {
                    commit: version.hash,
                    kind: ViolationKind::OrphanVersion,
                    description: format!("version {} points at a missing commit", version.tag),
                });
            }
        }

        for hash in find_cycles(&by_hash) {
            violations.push(Violation {
                commit: hash,
                kind: ViolationKind::Cycle,
                description: "commit is its own ancestor".into(),
            });
        }

        let report = ValidationReport {
            repository: *repository,
            commit_count: commits.len(),
            violations,
        };
        if report.is_valid() {
            debug!(repository = %repository, commits = report.commit_count, "commit graph valid");
        } else {
            warn!(
                repository = %repository,
                violations = report.violations.len(),
                "commit graph has violations"
            );
        }
        Ok(report)
    }
}

/// Validate with the default snapshot binding.
pub fn verify_graph<R: LedgerReader + ?Sized>(
    reader: &R,
    repository: &RepositoryId,
) -> LedgerResult<ValidationReport> {
    GraphValidator::default().validate(reader, repository)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Commits that close a cycle, found by iterative depth-first search.
fn find_cycles(by_hash: &HashMap<ObjectHash, &Commit>) -> Vec<ObjectHash> {
    let mut marks: HashMap<ObjectHash, Mark> = HashMap::new();
    let mut found = HashSet::new();

    let mut roots: Vec<&ObjectHash> = by_hash.keys().collect();
    roots.sort();
    for root in roots {
        if marks.contains_key(root) {
            continue;
        }
        // (node, index of the next parent to visit)
        let mut stack = vec![(*root, 0usize)];
        marks.insert(*root, Mark::Visiting);
        while let Some((node, next)) = stack.pop() {
            let parents = by_hash
                .get(&node)
                .map(|c| c.parent_commits.as_slice())
                .unwrap_or_default();
            match parents.get(next) {
                None => {
                    marks.insert(node, Mark::Done);
                }
                Some(parent) => {
                    stack.push((node, next + 1));
                    if !by_hash.contains_key(parent) {
                        continue;
                    }
                    match marks.get(parent) {
                        Some(Mark::Visiting) => {
                            found.insert(*parent);
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(*parent, Mark::Visiting);
                            stack.push((*parent, 0));
                        }
                    }
                }
            }
        }
    }

    let mut found: Vec<_> = found.into_iter().collect();
    found.sort();
    found
}
