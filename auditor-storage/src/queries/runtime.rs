//! io_operations / state_mutations queries.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{IoOperationRow, StateMutationRow};
use rusqlite::{params, Connection};

use super::sqe;

pub fn io_operations(conn: &Connection) -> Result<Vec<IoOperationRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, in_function, kind, target, is_static, mode,
                    requires_runtime_analysis
             FROM io_operations ORDER BY file, line",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(IoOperationRow {
                file: row.get(0)?,
                line: row.get(1)?,
                in_function: row.get(2)?,
                kind: row.get(3)?,
                target: row.get(4)?,
                is_static: row.get(5)?,
                mode: row.get(6)?,
                requires_runtime_analysis: row.get(7)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn state_mutations_by_file(
    conn: &Connection,
    file: &str,
) -> Result<Vec<StateMutationRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, in_function, target, operation,
                    is_init, is_property_setter, is_dunder_method
             FROM state_mutations WHERE file = ?1 ORDER BY line",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file], |row| {
            Ok(StateMutationRow {
                file: row.get(0)?,
                line: row.get(1)?,
                in_function: row.get(2)?,
                target: row.get(3)?,
                operation: row.get(4)?,
                is_init: row.get(5)?,
                is_property_setter: row.get(6)?,
                is_dunder_method: row.get(7)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}
