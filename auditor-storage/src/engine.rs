//! `FactStore` — the unified storage engine.
//!
//! Wraps `DatabaseManager` (read/write routing) + `BatchWriter` (batched
//! serialized writes). All reads go through `with_reader()`, all writes
//! through the batch channel or `with_writer()`. This is the single
//! owner of both — no code outside this crate touches a raw
//! `&Connection` for the Fact Store.

use std::path::Path;

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, CfgBlockRow, CfgEdgeRow, DepEntryRow, DepManifestRow,
    EndpointParamRow, EndpointRow, FactRow, FileRow, FindingRow, IoOperationRow, RefRow,
    ReturnRow, StateMutationRow, SymbolRow, TaintFlowRow,
};
use auditor_core::facts::tables::TableId;
use auditor_core::traits::storage::{IFactReader, IOutputSink};

use crate::batch::{BatchCommand, BatchWriter};
use crate::connection::DatabaseManager;
use crate::insert;
use crate::queries;
use crate::receipt::Receipt;
use crate::schema;

/// The unified Fact Store engine.
pub struct FactStore {
    db: DatabaseManager,
    batch: Option<BatchWriter>,
}

impl FactStore {
    /// Create a fresh store for an `index` run, replacing any prior file.
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        let db = DatabaseManager::create(path)?;
        let batch = db.open_batch_connection()?.map(BatchWriter::new);
        Ok(Self { db, batch })
    }

    /// Open an existing store read-mostly (`analyze` / `taint`).
    /// The schema contract is validated on open.
    pub fn open_existing(path: &Path) -> Result<Self, StorageError> {
        let db = DatabaseManager::open_existing(path)?;
        Ok(Self { db, batch: None })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let db = DatabaseManager::open_in_memory()?;
        Ok(Self { db, batch: None })
    }

    /// Enqueue a batch of rows for one table.
    ///
    /// The table name is checked against the registry; `UnknownTable` is
    /// fatal. Every row must target that same table.
    pub fn write_batch(&self, table_name: &str, rows: Vec<FactRow>) -> Result<(), StorageError> {
        let table = TableId::parse_name(table_name).ok_or_else(|| {
            ContractViolation::UnknownTable { table: table_name.to_string() }
        })?;
        self.write_rows(table, rows)
    }

    /// Typed variant of `write_batch`.
    pub fn write_rows(&self, table: TableId, rows: Vec<FactRow>) -> Result<(), StorageError> {
        for row in &rows {
            if row.table() != table {
                return Err(ContractViolation::UnknownTable {
                    table: format!("row for {} sent to {}", row.table().name(), table.name()),
                }
                .into());
            }
        }
        match &self.batch {
            Some(batch) => batch.send(BatchCommand::write(table, rows)),
            None => self.db.with_writer(|conn| insert::insert_rows(conn, &rows).map(|_| ())),
        }
    }

    /// Flush pending batch writes and block until committed.
    pub fn flush_sync(&self) -> Result<(), StorageError> {
        match &self.batch {
            Some(batch) => batch.flush_sync(),
            None => Ok(()),
        }
    }

    /// Verify the schema contract against the physical store.
    pub fn validate(&self) -> Result<(), StorageError> {
        self.db.with_writer(|conn| schema::validate(conn))
    }

    /// Count all tables into a receipt.
    pub fn receipt(&self) -> Result<Receipt, StorageError> {
        self.flush_sync()?;
        self.db.with_reader(|conn| Receipt::from_store(conn))
    }

    /// Reset an analyzer-output table before a re-run.
    ///
    /// Only output tables may be cleared; extracted tables are
    /// immutable for the life of the store.
    pub fn clear_outputs(&self, table: TableId) -> Result<(), StorageError> {
        if !matches!(table, TableId::TaintFlows | TableId::Findings) {
            return Err(StorageError::NotSupported {
                operation: format!("clear {}", table.name()),
                reason: "only analyzer-output tables can be cleared".to_string(),
            });
        }
        self.db.with_writer(|conn| {
            conn.execute(&format!("DELETE FROM {}", table.name()), [])
                .map(|_| ())
                .map_err(|e| StorageError::SqliteError { message: e.to_string() })
        })
    }

    /// WAL checkpoint delegation.
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        self.db.checkpoint()
    }

    /// Database file path (None for in-memory).
    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }
}

impl IFactReader for FactStore {
    fn load_files(&self) -> Result<Vec<FileRow>, StorageError> {
        self.db.with_reader(queries::files::load_all)
    }

    fn symbols_by_file(&self, file: &str) -> Result<Vec<SymbolRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::symbols_by_file(conn, file))
    }

    fn symbols_by_name(&self, name: &str) -> Result<Vec<SymbolRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::symbols_by_name(conn, name))
    }

    fn refs_by_file(&self, file: &str) -> Result<Vec<RefRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::refs_by_file(conn, file))
    }

    fn calls_by_file(&self, file: &str) -> Result<Vec<CallRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::calls_by_file(conn, file))
    }

    fn calls_to(&self, callee_name: &str) -> Result<Vec<CallRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::calls_to(conn, callee_name))
    }

    fn call_args_at(
        &self,
        file: &str,
        line: u32,
        callee_name: &str,
    ) -> Result<Vec<CallArgRow>, StorageError> {
        self.db
            .with_reader(|conn| queries::code::call_args_at(conn, file, line, callee_name))
    }

    fn assignments_in(
        &self,
        file: &str,
        function: &str,
    ) -> Result<Vec<AssignmentRow>, StorageError> {
        self.db
            .with_reader(|conn| queries::code::assignments_in(conn, file, function))
    }

    fn returns_in(&self, file: &str, function: &str) -> Result<Vec<ReturnRow>, StorageError> {
        self.db.with_reader(|conn| queries::code::returns_in(conn, file, function))
    }

    fn cfg_blocks_for(
        &self,
        file: &str,
        function: &str,
    ) -> Result<Vec<CfgBlockRow>, StorageError> {
        self.db.with_reader(|conn| queries::cfg::blocks_for(conn, file, function))
    }

    fn cfg_edges_for(&self, file: &str, function: &str) -> Result<Vec<CfgEdgeRow>, StorageError> {
        self.db.with_reader(|conn| queries::cfg::edges_for(conn, file, function))
    }

    fn endpoints(&self, kind: Option<&str>) -> Result<Vec<EndpointRow>, StorageError> {
        self.db.with_reader(|conn| queries::endpoints::endpoints(conn, kind))
    }

    fn endpoint_params(&self, pattern: &str) -> Result<Vec<EndpointParamRow>, StorageError> {
        self.db.with_reader(|conn| queries::endpoints::params_for(conn, pattern))
    }

    fn io_operations(&self) -> Result<Vec<IoOperationRow>, StorageError> {
        self.db.with_reader(queries::runtime::io_operations)
    }

    fn state_mutations_by_file(
        &self,
        file: &str,
    ) -> Result<Vec<StateMutationRow>, StorageError> {
        self.db
            .with_reader(|conn| queries::runtime::state_mutations_by_file(conn, file))
    }

    fn dep_manifests(&self) -> Result<Vec<DepManifestRow>, StorageError> {
        self.db.with_reader(queries::deps::manifests)
    }

    fn dep_entries(&self) -> Result<Vec<DepEntryRow>, StorageError> {
        self.db.with_reader(queries::deps::entries)
    }

    fn count_rows(&self, table: TableId) -> Result<i64, StorageError> {
        self.db.with_reader(|conn| queries::files::count(conn, table.name()))
    }
}

impl IOutputSink for FactStore {
    fn insert_taint_flows(&self, rows: &[TaintFlowRow]) -> Result<usize, StorageError> {
        let rows: Vec<FactRow> = rows.iter().cloned().map(FactRow::TaintFlow).collect();
        self.db.with_writer(|conn| insert::insert_rows(conn, &rows))
    }

    fn insert_findings(&self, rows: &[FindingRow]) -> Result<usize, StorageError> {
        let rows: Vec<FactRow> = rows.iter().cloned().map(FactRow::Finding).collect();
        self.db.with_writer(|conn| insert::insert_rows(conn, &rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_batch_rejects_unknown_table() {
        let store = FactStore::open_in_memory().unwrap();
        let err = store.write_batch("no_such_table", Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Contract(ContractViolation::UnknownTable { .. })
        ));
    }

    #[test]
    fn duplicate_primary_key_is_not_silently_merged() {
        let store = FactStore::open_in_memory().unwrap();
        let row = FactRow::Finding(FindingRow {
            file: "src/app.py".into(),
            line: 3,
            rule_id: "sql-string-build".into(),
            severity: "high".into(),
            message: "m".into(),
            evidence: "e".into(),
            analyzer: "patterns".into(),
        });
        store.write_rows(TableId::Findings, vec![row.clone()]).unwrap();
        let err = store.write_rows(TableId::Findings, vec![row]).unwrap_err();
        assert!(matches!(
            err,
            StorageError::Contract(ContractViolation::DuplicatePrimaryKey { .. })
        ));
    }
}
