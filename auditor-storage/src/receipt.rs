//! Per-run receipt: row counts per table, written after flush.
//!
//! The receipt is the reconciliation artifact — `index` writes it,
//! regression tests diff it across runs, and `validate` checks it
//! against the physical store.

use std::collections::BTreeMap;
use std::path::Path;

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::tables::TableId;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

/// Row counts per table for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receipt {
    /// table name → row count, in stable (sorted) order.
    pub tables: BTreeMap<String, i64>,
    /// Set when the producing run was cancelled mid-way.
    pub cancelled: bool,
    /// Seconds since the epoch at write time.
    pub created_at: u64,
}

impl Receipt {
    /// Count every registered table in the physical store.
    pub fn from_store(conn: &Connection) -> Result<Self, StorageError> {
        let mut tables = BTreeMap::new();
        for table in TableId::ALL {
            let count: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table.name()), [], |r| {
                    r.get(0)
                })
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
            tables.insert(table.name().to_string(), count);
        }
        Ok(Self {
            tables,
            cancelled: false,
            created_at: now_secs(),
        })
    }

    /// Reconcile flushed counts against this receipt.
    pub fn reconcile(&self, flushed: &BTreeMap<String, usize>) -> Result<(), StorageError> {
        for (table, flushed_count) in flushed {
            let stored = self.tables.get(table).copied().unwrap_or(0);
            if stored != *flushed_count as i64 {
                return Err(ContractViolation::RowCountMismatch {
                    table: table.clone(),
                    flushed: *flushed_count,
                    stored: stored as usize,
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn total_rows(&self) -> i64 {
        self.tables.values().sum()
    }

    pub fn write(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        std::fs::write(path, json)
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
        serde_json::from_str(&text)
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })
    }
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;

    #[test]
    fn empty_store_receipt_has_all_tables_at_zero() {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_all(&conn).unwrap();
        let receipt = Receipt::from_store(&conn).unwrap();
        assert_eq!(receipt.tables.len(), TableId::ALL.len());
        assert_eq!(receipt.total_rows(), 0);
    }
}
