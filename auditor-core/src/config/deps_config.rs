//! Dependency-checker configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DepsConfig {
    /// Query registries for newer versions. Default: false (offline).
    pub check_latest: Option<bool>,
    /// Accept pre-release versions as upgrade candidates. Default: false.
    pub allow_prerelease: Option<bool>,
    /// Registry request timeout in seconds. Default: 10.
    pub timeout_secs: Option<u64>,
}

impl DepsConfig {
    pub fn effective_allow_prerelease(&self) -> bool {
        self.allow_prerelease.unwrap_or(false)
    }

    pub fn effective_timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(10)
    }
}
