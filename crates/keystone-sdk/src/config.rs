use std::path::Path;

use keystone_ledger::CommitBinding;
use keystone_refs::names::validate_branch_name;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// Engine settings, loadable from TOML.
///
/// Every field is optional in the file; missing fields take their
/// [`Default`] value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Branch created when a repository is first opened.
    pub default_branch: String,
    /// What commit hashes bind to.
    pub commit_binding: CommitBinding,
    /// Prefix of automatic version tags (`v1`, `v2`, ...).
    pub version_tag_prefix: String,
    pub validate_after_rollback: bool,
    /// `trace`, `debug`, `info`, `warn`, or `error`.
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_branch: "main".into(),
            commit_binding: CommitBinding::Snapshot,
            version_tag_prefix: "v".into(),
            validate_after_rollback: true,
            log_level: "info".into(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> SdkResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SdkResult<String> {
        toml::to_string(self).map_err(|e| SdkError::Config(e.to_string()))
    }

    pub fn validate(&self) -> SdkResult<()> {
        validate_branch_name(&self.default_branch)
            .map_err(|e| SdkError::Config(format!("default_branch: {e}")))?;
        if self.version_tag_prefix.trim().is_empty() {
            return Err(SdkError::Config("version_tag_prefix must not be empty".into()));
        }
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| SdkError::Config(format!("unknown log_level {:?}", self.log_level)))?;
        Ok(())
    }
}
