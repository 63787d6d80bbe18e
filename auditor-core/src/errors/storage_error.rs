//! Storage-layer errors for SQLite operations.

use super::contract_violation::ContractViolation;
use super::error_code::{self, AuditorErrorCode};

/// Errors that can occur in the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("SQLite error: {message}")]
    SqliteError { message: String },

    #[error("database busy (another operation in progress)")]
    DbBusy,

    #[error("database corrupt: {details}")]
    DbCorrupt { details: String },

    #[error(transparent)]
    Contract(#[from] ContractViolation),

    #[error("operation not supported: {operation} — {reason}")]
    NotSupported { operation: String, reason: String },
}

impl AuditorErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DbBusy => error_code::DB_BUSY,
            Self::Contract(c) => c.error_code(),
            _ => error_code::STORAGE_ERROR,
        }
    }
}
