//! Branch name validation following git-style conventions.
//!
//! A valid name is non-empty, at most 255 bytes, contains no whitespace or
//! any of `~ ^ : ? * [ \`, has no `..` or `@{`, does not start or end with
//! `.` or `/`, does not end with `.lock`, and every `/`-separated component
//! is non-empty and does not start with `.`.

use crate::error::{RefError, RefResult};

const MAX_LEN: usize = 255;

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

const FORBIDDEN_SEQUENCES: &[(&str, &str)] = &[
    ("..", "must not contain '..'"),
    ("@{", "must not contain '@{'"),
    ("//", "must not contain consecutive slashes"),
];

fn violation(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("must not be empty".into());
    }
    if name.len() > MAX_LEN {
        return Some(format!("must be at most {MAX_LEN} bytes"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Some(format!("contains forbidden character {ch:?}"));
    }
    if let Some((_, reason)) = FORBIDDEN_SEQUENCES.iter().find(|(seq, _)| name.contains(seq)) {
        return Some((*reason).into());
    }
    if name.starts_with(['.', '/']) || name.ends_with(['.', '/']) {
        return Some("must not start or end with '.' or '/'".into());
    }
    if name.ends_with(".lock") {
        return Some("must not end with '.lock'".into());
    }
    name.split('/')
        .find(|c| c.is_empty() || c.starts_with('.'))
        .map(|c| format!("invalid path component {c:?}"))
}

/// Validate a branch name.
///
/// ```
/// use keystone_refs::names::validate_branch_name;
///
/// assert!(validate_branch_name("main").is_ok());
/// assert!(validate_branch_name("renovation/level-3").is_ok());
/// assert!(validate_branch_name("").is_err());
/// assert!(validate_branch_name("bad..name").is_err());
/// ```
pub fn validate_branch_name(name: &str) -> RefResult<()> {
    match violation(name) {
        None => Ok(()),
        Some(reason) => Err(RefError::InvalidBranchName {
            name: name.to_string(),
            reason,
        }),
    }
}
