//! endpoints / endpoint_params queries.
//!
//! Generic HTTP matching must exclude form-action endpoints; the `kind`
//! filter is how every cross-boundary consumer expresses that.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{EndpointParamRow, EndpointRow};
use rusqlite::{params, Connection, Row};

use super::sqe;

fn endpoint_from(row: &Row<'_>) -> rusqlite::Result<EndpointRow> {
    Ok(EndpointRow {
        file: row.get(0)?,
        line: row.get(1)?,
        method: row.get(2)?,
        pattern: row.get(3)?,
        handler: row.get(4)?,
        endpoint_kind: row.get(5)?,
        has_group_segments: row.get(6)?,
        has_optional_params: row.get(7)?,
        has_rest_params: row.get(8)?,
    })
}

const ENDPOINT_COLS: &str = "file, line, method, pattern, handler, endpoint_kind, \
                             has_group_segments, has_optional_params, has_rest_params";

pub fn endpoints(
    conn: &Connection,
    kind: Option<&str>,
) -> Result<Vec<EndpointRow>, StorageError> {
    match kind {
        Some(kind) => {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {ENDPOINT_COLS} FROM endpoints
                     WHERE endpoint_kind = ?1 ORDER BY file, line"
                ))
                .map_err(sqe)?;
            let rows = stmt.query_map(params![kind], |r| endpoint_from(r)).map_err(sqe)?;
            rows.collect::<Result<_, _>>().map_err(sqe)
        }
        None => {
            let mut stmt = conn
                .prepare_cached(&format!(
                    "SELECT {ENDPOINT_COLS} FROM endpoints ORDER BY file, line"
                ))
                .map_err(sqe)?;
            let rows = stmt.query_map([], |r| endpoint_from(r)).map_err(sqe)?;
            rows.collect::<Result<_, _>>().map_err(sqe)
        }
    }
}

pub fn params_for(conn: &Connection, pattern: &str) -> Result<Vec<EndpointParamRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, pattern, name, segment, is_optional, is_rest, matcher
             FROM endpoint_params WHERE pattern = ?1 ORDER BY segment",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map(params![pattern], |row| {
            Ok(EndpointParamRow {
                file: row.get(0)?,
                line: row.get(1)?,
                pattern: row.get(2)?,
                name: row.get(3)?,
                segment: row.get(4)?,
                is_optional: row.get(5)?,
                is_rest: row.get(6)?,
                matcher: row.get(7)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}
