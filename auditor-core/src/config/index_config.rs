//! Indexing (scan + extract + flush) configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum file size in bytes. Default: 1MB.
    pub max_file_size: Option<u64>,
    /// Number of worker threads. 0 = auto-detect.
    pub threads: Option<usize>,
    /// Include glob patterns — if non-empty, only matching paths are indexed.
    #[serde(default)]
    pub include: Vec<String>,
    /// Additional ignore patterns beyond .gitignore/.pfignore.
    #[serde(default)]
    pub extra_ignore: Vec<String>,
    /// Follow symbolic links. Default: false.
    pub follow_symlinks: Option<bool>,
    /// Test mode: duplicate primary keys after per-file dedup are fatal
    /// instead of logged-and-truncated. Default: false.
    pub strict: Option<bool>,
}

impl IndexConfig {
    pub fn effective_max_file_size(&self) -> u64 {
        self.max_file_size.unwrap_or(1_048_576)
    }

    pub fn effective_threads(&self) -> usize {
        self.threads.unwrap_or(0)
    }

    pub fn effective_strict(&self) -> bool {
        self.strict.unwrap_or(false)
    }
}
