//! Analyzer-pass errors. A failed analyzer is marked failed in the
//! report; the other analyzers continue.

use super::error_code::{self, AuditorErrorCode};
use super::storage_error::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("analyzer {analyzer} failed: {message}")]
    AnalyzerFailed { analyzer: String, message: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("analysis cancelled")]
    Cancelled,
}

impl AuditorErrorCode for AnalysisError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Cancelled => error_code::CANCELLED,
            _ => error_code::ANALYSIS_ERROR,
        }
    }
}
