//! Scanner output types.

use std::path::PathBuf;

use super::language_detect::Language;

/// A file found by the walker.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub file_size: u64,
    pub language: Option<Language>,
}
