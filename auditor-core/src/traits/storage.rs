//! Storage traits.
//!
//! Analyzers hold an `IFactReader` — strictly read-only over the
//! extracted tables. Analyzer outputs (taint paths, findings) go through
//! `IOutputSink`, never back into extracted tables.

use crate::errors::StorageError;
use crate::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, CfgBlockRow, CfgEdgeRow, DepEntryRow, DepManifestRow,
    EndpointParamRow, EndpointRow, FileRow, FindingRow, IoOperationRow, RefRow, ReturnRow,
    StateMutationRow, SymbolRow, TaintFlowRow,
};
use crate::facts::tables::TableId;

/// Read-only handle to the Fact Store.
pub trait IFactReader: Send + Sync {
    fn load_files(&self) -> Result<Vec<FileRow>, StorageError>;

    fn symbols_by_file(&self, file: &str) -> Result<Vec<SymbolRow>, StorageError>;
    fn symbols_by_name(&self, name: &str) -> Result<Vec<SymbolRow>, StorageError>;

    fn refs_by_file(&self, file: &str) -> Result<Vec<RefRow>, StorageError>;

    fn calls_by_file(&self, file: &str) -> Result<Vec<CallRow>, StorageError>;
    fn calls_to(&self, callee_name: &str) -> Result<Vec<CallRow>, StorageError>;
    fn call_args_at(
        &self,
        file: &str,
        line: u32,
        callee_name: &str,
    ) -> Result<Vec<CallArgRow>, StorageError>;

    fn assignments_in(&self, file: &str, function: &str)
        -> Result<Vec<AssignmentRow>, StorageError>;
    fn returns_in(&self, file: &str, function: &str) -> Result<Vec<ReturnRow>, StorageError>;

    fn cfg_blocks_for(&self, file: &str, function: &str)
        -> Result<Vec<CfgBlockRow>, StorageError>;
    fn cfg_edges_for(&self, file: &str, function: &str) -> Result<Vec<CfgEdgeRow>, StorageError>;

    /// Endpoints, optionally filtered by `endpoint_kind`.
    fn endpoints(&self, kind: Option<&str>) -> Result<Vec<EndpointRow>, StorageError>;
    fn endpoint_params(&self, pattern: &str) -> Result<Vec<EndpointParamRow>, StorageError>;

    fn io_operations(&self) -> Result<Vec<IoOperationRow>, StorageError>;
    fn state_mutations_by_file(&self, file: &str)
        -> Result<Vec<StateMutationRow>, StorageError>;

    fn dep_manifests(&self) -> Result<Vec<DepManifestRow>, StorageError>;
    fn dep_entries(&self) -> Result<Vec<DepEntryRow>, StorageError>;

    /// Row count of one table (receipt reconciliation, tests).
    fn count_rows(&self, table: TableId) -> Result<i64, StorageError>;
}

/// Write handle for analyzer outputs.
pub trait IOutputSink: Send + Sync {
    fn insert_taint_flows(&self, rows: &[TaintFlowRow]) -> Result<usize, StorageError>;
    fn insert_findings(&self, rows: &[FindingRow]) -> Result<usize, StorageError>;
}
