//! Physical schema for every registered fact table.
//!
//! The store is recreated from scratch each run — there is no migration
//! layer. `create_all` executes one DDL statement per `TableId`;
//! `validate` reconciles the physical store against the registry in both
//! directions and against `TABLE_COUNT`. Any mismatch aborts startup.
//!
//! Nullable policy: text columns default to '' when a producer may
//! legitimately have no value; NULL is used only where downstream code
//! distinguishes absent from empty (`io_operations.target`).

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::tables::{TableId, TABLE_COUNT};
use rusqlite::Connection;

/// DDL for one table.
pub fn ddl(table: TableId) -> &'static str {
    match table {
        TableId::Files => {
            "CREATE TABLE files (
                path TEXT NOT NULL,
                language TEXT NOT NULL DEFAULT '',
                content_hash INTEGER NOT NULL,
                file_size INTEGER NOT NULL,
                framework_tags TEXT NOT NULL DEFAULT '',
                parse_status TEXT NOT NULL DEFAULT 'ok',
                parse_error TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (path)
            )"
        }
        TableId::Symbols => {
            "CREATE TABLE symbols (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                kind TEXT NOT NULL,
                name TEXT NOT NULL,
                qualified_name TEXT NOT NULL,
                scope TEXT NOT NULL DEFAULT 'global',
                params TEXT NOT NULL DEFAULT '[]',
                symbol_id INTEGER NOT NULL,
                PRIMARY KEY (file, line, kind, qualified_name)
            )"
        }
        TableId::Refs => {
            "CREATE TABLE refs (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                resolution TEXT NOT NULL DEFAULT 'unresolved',
                target_symbol_id INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, name, kind)
            )"
        }
        TableId::Calls => {
            "CREATE TABLE calls (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                caller_function TEXT NOT NULL DEFAULT 'global',
                callee_name TEXT NOT NULL,
                receiver TEXT NOT NULL DEFAULT '',
                argument_count INTEGER NOT NULL DEFAULT 0,
                callee_unresolved INTEGER NOT NULL DEFAULT 0,
                requires_runtime_analysis INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, callee_name, caller_function)
            )"
        }
        TableId::CallArgs => {
            "CREATE TABLE call_args (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                callee_name TEXT NOT NULL,
                arg_index INTEGER NOT NULL,
                keyword TEXT NOT NULL DEFAULT '',
                expression TEXT NOT NULL DEFAULT '',
                read_vars TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (file, line, callee_name, arg_index)
            )"
        }
        TableId::Assignments => {
            "CREATE TABLE assignments (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL DEFAULT 'global',
                target TEXT NOT NULL,
                expression TEXT NOT NULL DEFAULT '',
                read_vars TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (file, line, target)
            )"
        }
        TableId::Returns => {
            "CREATE TABLE returns (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                read_vars TEXT NOT NULL DEFAULT '[]',
                PRIMARY KEY (file, line, in_function)
            )"
        }
        TableId::CfgBlocks => {
            "CREATE TABLE cfg_blocks (
                file TEXT NOT NULL,
                function TEXT NOT NULL,
                block_index INTEGER NOT NULL,
                kind TEXT NOT NULL,
                line INTEGER NOT NULL,
                end_line INTEGER NOT NULL,
                PRIMARY KEY (file, function, block_index)
            )"
        }
        TableId::CfgEdges => {
            "CREATE TABLE cfg_edges (
                file TEXT NOT NULL,
                function TEXT NOT NULL,
                from_block INTEGER NOT NULL,
                to_block INTEGER NOT NULL,
                kind TEXT NOT NULL,
                line INTEGER NOT NULL,
                PRIMARY KEY (file, function, from_block, to_block)
            )"
        }
        TableId::Endpoints => {
            "CREATE TABLE endpoints (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                method TEXT NOT NULL,
                pattern TEXT NOT NULL,
                handler TEXT NOT NULL DEFAULT '',
                endpoint_kind TEXT NOT NULL DEFAULT 'http',
                has_group_segments INTEGER NOT NULL DEFAULT 0,
                has_optional_params INTEGER NOT NULL DEFAULT 0,
                has_rest_params INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, method, pattern, endpoint_kind)
            )"
        }
        TableId::EndpointParams => {
            "CREATE TABLE endpoint_params (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                pattern TEXT NOT NULL,
                name TEXT NOT NULL,
                segment INTEGER NOT NULL,
                is_optional INTEGER NOT NULL DEFAULT 0,
                is_rest INTEGER NOT NULL DEFAULT 0,
                matcher TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (file, pattern, name)
            )"
        }
        TableId::OrmModels => {
            "CREATE TABLE orm_models (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                table_name TEXT NOT NULL DEFAULT '',
                framework TEXT NOT NULL,
                PRIMARY KEY (file, line, name)
            )"
        }
        TableId::OrmFields => {
            "CREATE TABLE orm_fields (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                model TEXT NOT NULL,
                name TEXT NOT NULL,
                column_type TEXT NOT NULL DEFAULT '',
                nullable INTEGER NOT NULL DEFAULT 0,
                primary_key INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, model, name)
            )"
        }
        TableId::OrmAssociations => {
            "CREATE TABLE orm_associations (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                model TEXT NOT NULL,
                kind TEXT NOT NULL,
                target TEXT NOT NULL,
                PRIMARY KEY (file, line, model, kind, target)
            )"
        }
        TableId::Jobs => {
            "CREATE TABLE jobs (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                queue TEXT NOT NULL DEFAULT '',
                framework TEXT NOT NULL,
                PRIMARY KEY (file, line, name)
            )"
        }
        TableId::JobSchedules => {
            "CREATE TABLE job_schedules (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                job_name TEXT NOT NULL,
                schedule TEXT NOT NULL DEFAULT '',
                framework TEXT NOT NULL,
                PRIMARY KEY (file, line, job_name)
            )"
        }
        TableId::DiInjections => {
            "CREATE TABLE di_injections (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                target TEXT NOT NULL,
                dependency TEXT NOT NULL,
                framework TEXT NOT NULL,
                PRIMARY KEY (file, line, target, dependency)
            )"
        }
        TableId::ValidationSchemas => {
            "CREATE TABLE validation_schemas (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                framework TEXT NOT NULL,
                field_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, name)
            )"
        }
        TableId::Forms => {
            "CREATE TABLE forms (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                framework TEXT NOT NULL,
                field_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, name)
            )"
        }
        TableId::Fixtures => {
            "CREATE TABLE fixtures (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                name TEXT NOT NULL,
                scope TEXT NOT NULL DEFAULT 'function',
                autouse INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, name)
            )"
        }
        TableId::Parametrizations => {
            "CREATE TABLE parametrizations (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                test_name TEXT NOT NULL,
                param_names TEXT NOT NULL DEFAULT '',
                case_count INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, test_name)
            )"
        }
        TableId::Markers => {
            "CREATE TABLE markers (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                test_name TEXT NOT NULL,
                marker TEXT NOT NULL,
                PRIMARY KEY (file, line, test_name, marker)
            )"
        }
        TableId::StateMutations => {
            "CREATE TABLE state_mutations (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                target TEXT NOT NULL,
                operation TEXT NOT NULL,
                is_init INTEGER NOT NULL DEFAULT 0,
                is_property_setter INTEGER NOT NULL DEFAULT 0,
                is_dunder_method INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, target, operation)
            )"
        }
        TableId::IoOperations => {
            "CREATE TABLE io_operations (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                kind TEXT NOT NULL,
                target TEXT,
                is_static INTEGER NOT NULL DEFAULT 1,
                mode TEXT NOT NULL DEFAULT '',
                requires_runtime_analysis INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, kind)
            )"
        }
        TableId::ExceptionFlows => {
            "CREATE TABLE exception_flows (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                kind TEXT NOT NULL,
                exception_type TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (file, line, kind, exception_type)
            )"
        }
        TableId::PropertyAccessors => {
            "CREATE TABLE property_accessors (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                class_name TEXT NOT NULL,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                PRIMARY KEY (file, line, class_name, name, kind)
            )"
        }
        TableId::GeneratorYields => {
            "CREATE TABLE generator_yields (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                expression TEXT NOT NULL DEFAULT '',
                is_delegated INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line)
            )"
        }
        TableId::LoopMetrics => {
            "CREATE TABLE loop_metrics (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                in_function TEXT NOT NULL,
                kind TEXT NOT NULL,
                depth INTEGER NOT NULL DEFAULT 1,
                has_early_exit INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line)
            )"
        }
        TableId::DepManifests => {
            "CREATE TABLE dep_manifests (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                package_manager TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                version TEXT NOT NULL DEFAULT '',
                build_system TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (file, package_manager)
            )"
        }
        TableId::DepEntries => {
            "CREATE TABLE dep_entries (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                package_manager TEXT NOT NULL,
                name TEXT NOT NULL,
                spec TEXT NOT NULL DEFAULT '',
                group_name TEXT NOT NULL DEFAULT '',
                is_optional INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, name, group_name)
            )"
        }
        TableId::TaintFlows => {
            "CREATE TABLE taint_flows (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                source_expression TEXT NOT NULL DEFAULT '',
                sink_file TEXT NOT NULL,
                sink_line INTEGER NOT NULL,
                sink_expression TEXT NOT NULL DEFAULT '',
                sink_kind TEXT NOT NULL,
                call_stack TEXT NOT NULL,
                depth INTEGER NOT NULL DEFAULT 0,
                requires_runtime_analysis INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (file, line, sink_file, sink_line, call_stack)
            )"
        }
        TableId::Findings => {
            "CREATE TABLE findings (
                file TEXT NOT NULL,
                line INTEGER NOT NULL,
                rule_id TEXT NOT NULL,
                severity TEXT NOT NULL DEFAULT 'info',
                message TEXT NOT NULL DEFAULT '',
                evidence TEXT NOT NULL DEFAULT '',
                analyzer TEXT NOT NULL,
                PRIMARY KEY (rule_id, file, line, analyzer)
            )"
        }
    }
}

/// Secondary indexes for analyzer access paths.
const INDEXES: &[&str] = &[
    "CREATE INDEX idx_symbols_name ON symbols (name)",
    "CREATE INDEX idx_symbols_qualified ON symbols (qualified_name)",
    "CREATE INDEX idx_refs_name ON refs (name)",
    "CREATE INDEX idx_calls_callee ON calls (callee_name)",
    "CREATE INDEX idx_assignments_fn ON assignments (file, in_function)",
    "CREATE INDEX idx_returns_fn ON returns (file, in_function)",
    "CREATE INDEX idx_endpoints_kind ON endpoints (endpoint_kind)",
    "CREATE INDEX idx_findings_rule ON findings (rule_id)",
];

/// Create every registered table and index in a fresh store.
///
/// Fails with `TableCountMismatch` before touching the store if the
/// registry itself is inconsistent with `TABLE_COUNT`.
pub fn create_all(conn: &Connection) -> Result<(), StorageError> {
    if TableId::ALL.len() != TABLE_COUNT {
        return Err(ContractViolation::TableCountMismatch {
            declared: TABLE_COUNT,
            actual: TableId::ALL.len(),
        }
        .into());
    }

    for table in TableId::ALL {
        conn.execute_batch(ddl(*table))
            .map_err(|e| StorageError::SqliteError {
                message: format!("creating {}: {}", table.name(), e),
            })?;
    }
    for index in INDEXES {
        conn.execute_batch(index)
            .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    }
    Ok(())
}

/// Reconcile the physical store against the registry in both directions.
pub fn validate(conn: &Connection) -> Result<(), StorageError> {
    let mut stmt = conn
        .prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    let physical: Vec<String> = stmt
        .query_map([], |row| row.get(0))
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?
        .collect::<Result<_, _>>()
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;

    for name in &physical {
        if TableId::parse_name(name).is_none() {
            return Err(ContractViolation::OrphanTable { table: name.clone() }.into());
        }
    }
    for table in TableId::ALL {
        if !physical.iter().any(|n| n == table.name()) {
            return Err(ContractViolation::MissingTable {
                table: table.name().to_string(),
            }
            .into());
        }
    }
    if physical.len() != TABLE_COUNT {
        return Err(ContractViolation::PhysicalCountMismatch {
            declared: TABLE_COUNT,
            physical: physical.len(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_validate_passes() {
        let conn = Connection::open_in_memory().unwrap();
        create_all(&conn).unwrap();
        validate(&conn).unwrap();
    }

    #[test]
    fn orphan_table_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        create_all(&conn).unwrap();
        conn.execute_batch("CREATE TABLE stray (id INTEGER PRIMARY KEY)")
            .unwrap();
        let err = validate(&conn).unwrap_err();
        assert!(err.to_string().contains("stray"));
    }

    #[test]
    fn missing_table_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        create_all(&conn).unwrap();
        conn.execute_batch("DROP TABLE markers").unwrap();
        assert!(validate(&conn).is_err());
    }
}
