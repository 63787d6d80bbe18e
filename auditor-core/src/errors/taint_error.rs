//! Taint-engine errors.

use super::error_code::{self, AuditorErrorCode};
use super::storage_error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum TaintError {
    #[error("taint path exceeded max depth {max_depth}")]
    PathTooLong { max_depth: u32 },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("taint analysis cancelled")]
    Cancelled,
}

impl AuditorErrorCode for TaintError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::TAINT_ERROR,
        }
    }
}
