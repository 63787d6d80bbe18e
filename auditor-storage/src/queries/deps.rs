//! dep_manifests / dep_entries queries.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{DepEntryRow, DepManifestRow};
use rusqlite::Connection;

use super::sqe;

pub fn manifests(conn: &Connection) -> Result<Vec<DepManifestRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, package_manager, name, version, build_system
             FROM dep_manifests ORDER BY file",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DepManifestRow {
                file: row.get(0)?,
                line: row.get(1)?,
                package_manager: row.get(2)?,
                name: row.get(3)?,
                version: row.get(4)?,
                build_system: row.get(5)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}

pub fn entries(conn: &Connection) -> Result<Vec<DepEntryRow>, StorageError> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT file, line, package_manager, name, spec, group_name, is_optional
             FROM dep_entries ORDER BY file, name",
        )
        .map_err(sqe)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(DepEntryRow {
                file: row.get(0)?,
                line: row.get(1)?,
                package_manager: row.get(2)?,
                name: row.get(3)?,
                spec: row.get(4)?,
                group_name: row.get(5)?,
                is_optional: row.get(6)?,
            })
        })
        .map_err(sqe)?;
    rows.collect::<Result<_, _>>().map_err(sqe)
}
