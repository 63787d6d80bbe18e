//! File-discovery errors.

use super::error_code::{self, AuditorErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("project root does not exist: {path}")]
    RootMissing { path: String },

    #[error("walk failed: {message}")]
    WalkFailed { message: String },

    #[error("io error reading {path}: {message}")]
    Io { path: String, message: String },
}

impl AuditorErrorCode for ScanError {
    fn error_code(&self) -> &'static str {
        error_code::SCAN_ERROR
    }
}
