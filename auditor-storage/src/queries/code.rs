//! symbols / refs / calls / call_args / assignments / returns queries —
//! the tables the taint engine and reference resolution read hardest.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, RefRow, ReturnRow, SymbolRow,
};
use rusqlite::{params, Connection, Row};

use super::sqe;

fn symbol_from(row: &Row<'_>) -> rusqlite::Result<SymbolRow> {
    Ok(SymbolRow {
        file: row.get(0)?,
        line: row.get(1)?,
        end_line: row.get(2)?,
        kind: row.get(3)?,
        name: row.get(4)?,
        qualified_name: row.get(5)?,
        scope: row.get(6)?,
        params: row.get(7)?,
        symbol_id: row.get(8)?,
    })
}

const SYMBOL_COLS: &str =
    "file, line, end_line, kind, name, qualified_name, scope, params, symbol_id";

pub fn symbols_by_file(conn: &Connection, file: &str) -> Result<Vec<SymbolRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {SYMBOL_COLS} FROM symbols WHERE file = ?1 ORDER BY line"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![file], |r| symbol_from(r)).map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn symbols_by_name(conn: &Connection, name: &str) -> Result<Vec<SymbolRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {SYMBOL_COLS} FROM symbols WHERE name = ?1 ORDER BY file, line"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![name], |r| symbol_from(r)).map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn refs_by_file(conn: &Connection, file: &str) -> Result<Vec<RefRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, name, kind, resolution, target_symbol_id
             FROM refs WHERE file = ?1 ORDER BY line",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file], |row| {
            Ok(RefRow {
                file: row.get(0)?,
                line: row.get(1)?,
                name: row.get(2)?,
                kind: row.get(3)?,
                resolution: row.get(4)?,
                target_symbol_id: row.get(5)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

fn call_from(row: &Row<'_>) -> rusqlite::Result<CallRow> {
    Ok(CallRow {
        file: row.get(0)?,
        line: row.get(1)?,
        caller_function: row.get(2)?,
        callee_name: row.get(3)?,
        receiver: row.get(4)?,
        argument_count: row.get(5)?,
        callee_unresolved: row.get(6)?,
        requires_runtime_analysis: row.get(7)?,
    })
}

const CALL_COLS: &str = "file, line, caller_function, callee_name, receiver, \
                         argument_count, callee_unresolved, requires_runtime_analysis";

pub fn calls_by_file(conn: &Connection, file: &str) -> Result<Vec<CallRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {CALL_COLS} FROM calls WHERE file = ?1 ORDER BY line"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![file], |r| call_from(r)).map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn calls_to(conn: &Connection, callee_name: &str) -> Result<Vec<CallRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {CALL_COLS} FROM calls WHERE callee_name = ?1 ORDER BY file, line"
        ))
        .map_err(sqe)?;
    let rows = stmt.query_map(params![callee_name], |r| call_from(r)).map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn call_args_at(
    conn: &Connection,
    file: &str,
    line: u32,
    callee_name: &str,
) -> Result<Vec<CallArgRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, callee_name, arg_index, keyword, expression, read_vars
             FROM call_args WHERE file = ?1 AND line = ?2 AND callee_name = ?3
             ORDER BY arg_index",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file, line, callee_name], |row| {
            Ok(CallArgRow {
                file: row.get(0)?,
                line: row.get(1)?,
                callee_name: row.get(2)?,
                arg_index: row.get(3)?,
                keyword: row.get(4)?,
                expression: row.get(5)?,
                read_vars: row.get(6)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn assignments_in(
    conn: &Connection,
    file: &str,
    function: &str,
) -> Result<Vec<AssignmentRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, in_function, target, expression, read_vars
             FROM assignments WHERE file = ?1 AND in_function = ?2 ORDER BY line",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file, function], |row| {
            Ok(AssignmentRow {
                file: row.get(0)?,
                line: row.get(1)?,
                in_function: row.get(2)?,
                target: row.get(3)?,
                expression: row.get(4)?,
                read_vars: row.get(5)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn returns_in(
    conn: &Connection,
    file: &str,
    function: &str,
) -> Result<Vec<ReturnRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, in_function, read_vars
             FROM returns WHERE file = ?1 AND in_function = ?2 ORDER BY line",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file, function], |row| {
            Ok(ReturnRow {
                file: row.get(0)?,
                line: row.get(1)?,
                in_function: row.get(2)?,
                read_vars: row.get(3)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}
