//! files table queries.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::FileRow;
use rusqlite::Connection;

use super::sqe;

pub fn load_all(conn: &Connection) -> Result<Vec<FileRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT path, language, content_hash, file_size, framework_tags,
                    parse_status, parse_error
             FROM files ORDER BY path",
        )
        .map_err(sqe)?;

    let rows = stmt
        .query_map([], |row| {
            Ok(FileRow {
                path: row.get(0)?,
                language: row.get(1)?,
                content_hash: row.get(2)?,
                file_size: row.get(3)?,
                framework_tags: row.get(4)?,
                parse_status: row.get(5)?,
                parse_error: row.get(6)?,
            })
        })
        .map_err(sqe)?;

    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn count(conn: &Connection, table_name: &str) -> Result<i64, StorageError> {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table_name), [], |r| r.get(0))
        .map_err(sqe)
}
