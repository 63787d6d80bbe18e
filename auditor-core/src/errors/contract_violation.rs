//! Extraction-to-storage contract violations.
//!
//! Every variant is fatal: there is no "skip and continue" mode for
//! schema drift, and the engine refuses to run with an inconsistent
//! registry.

use super::error_code::{self, AuditorErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ContractViolation {
    #[error("write to unregistered table: {table}")]
    UnknownTable { table: String },

    #[error("table {table} declared twice")]
    DuplicateTable { table: String },

    #[error("declared table count {declared} does not match registry size {actual}")]
    TableCountMismatch { declared: usize, actual: usize },

    #[error("physical store table count {physical} does not match declared {declared}")]
    PhysicalCountMismatch { declared: usize, physical: usize },

    #[error("table {table} is declared but missing from the physical store")]
    MissingTable { table: String },

    #[error("physical table {table} is not declared in the registry")]
    OrphanTable { table: String },

    #[error("row for table {table} carries a pre-normalization file column: {file}")]
    ForbiddenFileColumn { table: String, file: String },

    #[error("duplicate primary key in {table} after per-file dedup: {key}")]
    DuplicatePrimaryKey { table: String, key: String },

    #[error("receipt mismatch for {table}: flushed {flushed}, stored {stored}")]
    RowCountMismatch {
        table: String,
        flushed: usize,
        stored: usize,
    },
}

impl AuditorErrorCode for ContractViolation {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownTable { .. } => error_code::UNKNOWN_TABLE,
            Self::TableCountMismatch { .. } | Self::PhysicalCountMismatch { .. } => {
                error_code::TABLE_COUNT_MISMATCH
            }
            Self::MissingTable { .. } | Self::OrphanTable { .. } => error_code::ORPHAN_TABLE,
            Self::ForbiddenFileColumn { .. } => error_code::FORBIDDEN_FILE_COLUMN,
            Self::DuplicatePrimaryKey { .. } => error_code::DUPLICATE_PRIMARY_KEY,
            Self::RowCountMismatch { .. } => error_code::ROW_COUNT_MISMATCH,
            _ => error_code::CONTRACT_VIOLATION,
        }
    }
}
