use chrono::{DateTime, Utc};
use keystone_ledger::{Author, ChangesSummary, Commit};
use serde::{Deserialize, Serialize};

/// A commit of the live building state, as SDK users describe it.
#[derive(Clone, Debug)]
pub struct CommitRequest {
    pub message: String,
    pub author: Author,
    pub description: Option<String>,
    pub tags: Vec<String>,
    /// Overrides the automatic `v<N>` version tag.
    pub version_tag: Option<String>,
    /// Target branch; the checked-out branch when `None`.
    pub branch: Option<String>,
}

impl CommitRequest {
    pub fn new(message: impl Into<String>, author: Author) -> Self {
        Self {
            message: message.into(),
            author,
            description: None,
            tags: Vec::new(),
            version_tag: None,
            branch: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_version_tag(mut self, tag: impl Into<String>) -> Self {
        self.version_tag = Some(tag.into());
        self
    }

    pub fn on_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }
}

/// One line of `log` output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub short_hash: String,
    pub message: String,
    pub author: String,
    pub parents: usize,
    pub is_merge: bool,
    pub changes: ChangesSummary,
    pub committed_at: DateTime<Utc>,
}

impl From<&Commit> for LogEntry {
    fn from(c: &Commit) -> Self {
        Self {
            short_hash: c.short_hash.clone(),
            message: c.message.clone(),
            author: c.author.to_string(),
            parents: c.parent_commits.len(),
            is_merge: c.is_merge,
            changes: c.changes_summary,
            committed_at: c.committed_at,
        }
    }
}
