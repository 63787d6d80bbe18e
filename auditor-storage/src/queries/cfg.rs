//! cfg_blocks / cfg_edges queries.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{CfgBlockRow, CfgEdgeRow};
use rusqlite::{params, Connection};

use super::sqe;

pub fn blocks_for(
    conn: &Connection,
    file: &str,
    function: &str,
) -> Result<Vec<CfgBlockRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, function, block_index, kind, line, end_line
             FROM cfg_blocks WHERE file = ?1 AND function = ?2 ORDER BY block_index",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file, function], |row| {
            Ok(CfgBlockRow {
                file: row.get(0)?,
                function: row.get(1)?,
                block_index: row.get(2)?,
                kind: row.get(3)?,
                line: row.get(4)?,
                end_line: row.get(5)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn edges_for(
    conn: &Connection,
    file: &str,
    function: &str,
) -> Result<Vec<CfgEdgeRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, function, from_block, to_block, kind, line
             FROM cfg_edges WHERE file = ?1 AND function = ?2
             ORDER BY from_block, to_block",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![file, function], |row| {
            Ok(CfgEdgeRow {
                file: row.get(0)?,
                function: row.get(1)?,
                from_block: row.get(2)?,
                to_block: row.get(3)?,
                kind: row.get(4)?,
                line: row.get(5)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}
