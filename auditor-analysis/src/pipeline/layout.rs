//! Persisted state layout under `project-root/.pf/`.

use std::path::{Path, PathBuf};

pub fn pf_dir(root: &Path) -> PathBuf {
    root.join(".pf")
}

/// The Fact Store.
pub fn db_path(root: &Path) -> PathBuf {
    pf_dir(root).join("repo_index.db")
}

/// Current-run receipt.
pub fn receipt_path(root: &Path) -> PathBuf {
    pf_dir(root).join("receipt.json")
}

/// Per-run receipt snapshots.
pub fn history_dir(root: &Path) -> PathBuf {
    pf_dir(root).join("history")
}

/// Taint findings, one object per path.
pub fn taint_path(root: &Path) -> PathBuf {
    pf_dir(root).join("taint_analysis.json")
}

/// Documentation capsule root.
pub fn docs_dir(root: &Path) -> PathBuf {
    pf_dir(root).join("context").join("docs")
}
