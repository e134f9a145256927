//! Commit and version records and commit hashing.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use keystone_crypto::ContentHasher;
use keystone_facility::Category;
use keystone_types::{BranchId, CommitId, ObjectHash, RepositoryId, VersionId};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Who made a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub id: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            id: id.into(),
        }
    }

    /// Reject characters that would let two authors share an `author`
    /// header line.
    pub fn validate(&self) -> LedgerResult<()> {
        const DELIMITERS: &[char] = &['<', '>', '\n'];
        const LINE_BREAK: &[char] = &['\n'];
        let fields = [
            ("name", self.name.as_str(), DELIMITERS),
            ("email", self.email.as_str(), DELIMITERS),
            ("id", self.id.as_str(), LINE_BREAK),
        ];
        for (field, value, reserved) in fields {
            if value.contains(reserved) {
                return Err(LedgerError::InvalidRequest(format!(
                    "author {field} {value:?} contains a reserved character"
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// Added / modified / removed counts for one category.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCounts {
    pub added: u64,
    pub modified: u64,
    pub removed: u64,
}

impl ChangeCounts {
    pub fn total(&self) -> u64 {
        self.added + self.modified + self.removed
    }
}

/// Per-category change counts between two states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangesSummary {
    pub buildings: ChangeCounts,
    pub floors: ChangeCounts,
    pub rooms: ChangeCounts,
    pub equipment: ChangeCounts,
    pub points: ChangeCounts,
}

impl ChangesSummary {
    pub fn get(&self, category: Category) -> &ChangeCounts {
        match category {
            Category::Buildings => &self.buildings,
            Category::Floors => &self.floors,
            Category::Rooms => &self.rooms,
            Category::Equipment => &self.equipment,
            Category::Points => &self.points,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut ChangeCounts {
        match category {
            Category::Buildings => &mut self.buildings,
            Category::Floors => &mut self.floors,
            Category::Rooms => &mut self.rooms,
            Category::Equipment => &mut self.equipment,
            Category::Points => &mut self.points,
        }
    }

    pub fn total(&self) -> u64 {
        Category::ALL.iter().map(|c| self.get(*c).total()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// What the `tree` line of a commit hash refers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitBinding {
    /// The captured snapshot's hash.
    #[default]
    Snapshot,
    /// The branch id. Kept for compatibility with histories recorded before
    /// commits were bound to content.
    Branch,
}

impl CommitBinding {
    pub fn tree_ref(&self, snapshot_hash: &ObjectHash, branch_id: &BranchId) -> String {
        match self {
            Self::Snapshot => snapshot_hash.to_hex(),
            Self::Branch => branch_id.to_string(),
        }
    }
}

/// Compute a commit hash from its canonical header:
///
/// ```text
/// tree <ref>
/// parent <hash>        (one line per parent, in order)
/// author <name> <<email>> <id>
/// timestamp <rfc3339, nanoseconds>
///
/// <message>
/// ```
pub fn commit_hash(
    tree_ref: &str,
    parents: &[ObjectHash],
    author: &Author,
    timestamp: &DateTime<Utc>,
    message: &str,
) -> ObjectHash {
    let mut header = format!("tree {tree_ref}\n");
    for parent in parents {
        header.push_str(&format!("parent {parent}\n"));
    }
    header.push_str(&format!(
        "author {} <{}> {}\ntimestamp {}\n\n",
        author.name,
        author.email,
        author.id,
        timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
    ));
    ContentHasher::digest_parts([header.as_bytes(), message.as_bytes()])
}

/// An immutable commit record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: CommitId,
    pub repository_id: RepositoryId,
    /// The branch whose HEAD this commit became.
    pub branch_id: BranchId,
    pub version_id: VersionId,
    pub commit_hash: ObjectHash,
    /// Display only. Identity comparisons use `commit_hash`.
    pub short_hash: String,
    pub message: String,
    pub description: Option<String>,
    pub author: Author,
    pub parent_commits: Vec<ObjectHash>,
    pub is_merge: bool,
    pub changes_summary: ChangesSummary,
    pub tags: Vec<String>,
    pub committed_at: DateTime<Utc>,
    pub snapshot_hash: ObjectHash,
}

impl Commit {
    pub fn first_parent(&self) -> Option<&ObjectHash> {
        self.parent_commits.first()
    }

    pub fn is_root(&self) -> bool {
        self.parent_commits.is_empty()
    }

    /// Recompute this commit's hash under `binding`.
    pub fn recompute_hash(&self, binding: CommitBinding) -> ObjectHash {
        commit_hash(
            &binding.tree_ref(&self.snapshot_hash, &self.branch_id),
            &self.parent_commits,
            &self.author,
            &self.committed_at,
            &self.message,
        )
    }
}

/// How a version came to be recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSource {
    Commit,
    Merge,
    Rollback,
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => write!(f, "commit"),
            Self::Merge => write!(f, "merge"),
            Self::Rollback => write!(f, "rollback"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    pub source: VersionSource,
    pub change_count: u64,
}

/// A human-taggable point in history tied to one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: VersionId,
    pub repository_id: RepositoryId,
    /// Unique per repository.
    pub tag: String,
    /// Hash of the commit that recorded this version.
    pub hash: ObjectHash,
    pub snapshot_ref: ObjectHash,
    pub parent_hash: Option<ObjectHash>,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    pub metadata: VersionMetadata,
}

/// Ways a caller can name a version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VersionRef {
    Id(VersionId),
    Tag(String),
    /// Full commit hash.
    Commit(ObjectHash),
}

impl fmt::Display for VersionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "version {id}"),
            Self::Tag(tag) => write!(f, "tag {tag}"),
            Self::Commit(hash) => write!(f, "commit {}", hash.short_hex()),
        }
    }
}
