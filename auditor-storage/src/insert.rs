//! Row insertion, one statement per table.
//!
//! Inserts are plain — never `OR REPLACE`/`OR IGNORE`. Deduplication is
//! the normalizer's job before flush; a primary-key collision here means
//! the dedup contract was broken and surfaces as `DuplicatePrimaryKey`
//! rather than a silent last-writer-wins merge.

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::rows::FactRow;
use rusqlite::{params, Connection, ErrorCode};

fn map_err(e: rusqlite::Error, row: &FactRow) -> StorageError {
    if let rusqlite::Error::SqliteFailure(inner, _) = &e {
        if inner.code == ErrorCode::ConstraintViolation {
            return ContractViolation::DuplicatePrimaryKey {
                table: row.table().name().to_string(),
                key: row.primary_key(),
            }
            .into();
        }
    }
    StorageError::SqliteError { message: e.to_string() }
}

/// Insert one row into its table.
pub fn insert_row(conn: &Connection, row: &FactRow) -> Result<(), StorageError> {
    let result = match row {
        FactRow::File(r) => conn
            .prepare_cached(
                "INSERT INTO files
                 (path, language, content_hash, file_size, framework_tags, parse_status, parse_error)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.path, r.language, r.content_hash, r.file_size,
                    r.framework_tags, r.parse_status, r.parse_error,
                ])
            }),
        FactRow::Symbol(r) => conn
            .prepare_cached(
                "INSERT INTO symbols
                 (file, line, end_line, kind, name, qualified_name, scope, params, symbol_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.end_line, r.kind, r.name,
                    r.qualified_name, r.scope, r.params, r.symbol_id,
                ])
            }),
        FactRow::Ref(r) => conn
            .prepare_cached(
                "INSERT INTO refs (file, line, name, kind, resolution, target_symbol_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.name, r.kind, r.resolution, r.target_symbol_id,
                ])
            }),
        FactRow::Call(r) => conn
            .prepare_cached(
                "INSERT INTO calls
                 (file, line, caller_function, callee_name, receiver, argument_count,
                  callee_unresolved, requires_runtime_analysis)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.caller_function, r.callee_name, r.receiver,
                    r.argument_count, r.callee_unresolved, r.requires_runtime_analysis,
                ])
            }),
        FactRow::CallArg(r) => conn
            .prepare_cached(
                "INSERT INTO call_args
                 (file, line, callee_name, arg_index, keyword, expression, read_vars)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.callee_name, r.arg_index,
                    r.keyword, r.expression, r.read_vars,
                ])
            }),
        FactRow::Assignment(r) => conn
            .prepare_cached(
                "INSERT INTO assignments (file, line, in_function, target, expression, read_vars)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.in_function, r.target, r.expression, r.read_vars,
                ])
            }),
        FactRow::Return(r) => conn
            .prepare_cached(
                "INSERT INTO returns (file, line, in_function, read_vars)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .and_then(|mut s| s.execute(params![r.file, r.line, r.in_function, r.read_vars])),
        FactRow::CfgBlock(r) => conn
            .prepare_cached(
                "INSERT INTO cfg_blocks (file, function, block_index, kind, line, end_line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.function, r.block_index, r.kind, r.line, r.end_line,
                ])
            }),
        FactRow::CfgEdge(r) => conn
            .prepare_cached(
                "INSERT INTO cfg_edges (file, function, from_block, to_block, kind, line)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.function, r.from_block, r.to_block, r.kind, r.line,
                ])
            }),
        FactRow::Endpoint(r) => conn
            .prepare_cached(
                "INSERT INTO endpoints
                 (file, line, method, pattern, handler, endpoint_kind,
                  has_group_segments, has_optional_params, has_rest_params)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.method, r.pattern, r.handler, r.endpoint_kind,
                    r.has_group_segments, r.has_optional_params, r.has_rest_params,
                ])
            }),
        FactRow::EndpointParam(r) => conn
            .prepare_cached(
                "INSERT INTO endpoint_params
                 (file, line, pattern, name, segment, is_optional, is_rest, matcher)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.pattern, r.name, r.segment,
                    r.is_optional, r.is_rest, r.matcher,
                ])
            }),
        FactRow::OrmModel(r) => conn
            .prepare_cached(
                "INSERT INTO orm_models (file, line, name, table_name, framework)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.name, r.table_name, r.framework])
            }),
        FactRow::OrmField(r) => conn
            .prepare_cached(
                "INSERT INTO orm_fields
                 (file, line, model, name, column_type, nullable, primary_key)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.model, r.name, r.column_type,
                    r.nullable, r.primary_key,
                ])
            }),
        FactRow::OrmAssociation(r) => conn
            .prepare_cached(
                "INSERT INTO orm_associations (file, line, model, kind, target)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| s.execute(params![r.file, r.line, r.model, r.kind, r.target])),
        FactRow::Job(r) => conn
            .prepare_cached(
                "INSERT INTO jobs (file, line, name, queue, framework)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| s.execute(params![r.file, r.line, r.name, r.queue, r.framework])),
        FactRow::JobSchedule(r) => conn
            .prepare_cached(
                "INSERT INTO job_schedules (file, line, job_name, schedule, framework)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.job_name, r.schedule, r.framework])
            }),
        FactRow::DiInjection(r) => conn
            .prepare_cached(
                "INSERT INTO di_injections (file, line, target, dependency, framework)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.target, r.dependency, r.framework])
            }),
        FactRow::ValidationSchema(r) => conn
            .prepare_cached(
                "INSERT INTO validation_schemas (file, line, name, framework, field_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.name, r.framework, r.field_count])
            }),
        FactRow::Form(r) => conn
            .prepare_cached(
                "INSERT INTO forms (file, line, name, framework, field_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.name, r.framework, r.field_count])
            }),
        FactRow::Fixture(r) => conn
            .prepare_cached(
                "INSERT INTO fixtures (file, line, name, scope, autouse)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| s.execute(params![r.file, r.line, r.name, r.scope, r.autouse])),
        FactRow::Parametrization(r) => conn
            .prepare_cached(
                "INSERT INTO parametrizations (file, line, test_name, param_names, case_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.test_name, r.param_names, r.case_count])
            }),
        FactRow::Marker(r) => conn
            .prepare_cached(
                "INSERT INTO markers (file, line, test_name, marker)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .and_then(|mut s| s.execute(params![r.file, r.line, r.test_name, r.marker])),
        FactRow::StateMutation(r) => conn
            .prepare_cached(
                "INSERT INTO state_mutations
                 (file, line, in_function, target, operation,
                  is_init, is_property_setter, is_dunder_method)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.in_function, r.target, r.operation,
                    r.is_init, r.is_property_setter, r.is_dunder_method,
                ])
            }),
        FactRow::IoOperation(r) => conn
            .prepare_cached(
                "INSERT INTO io_operations
                 (file, line, in_function, kind, target, is_static, mode,
                  requires_runtime_analysis)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.in_function, r.kind, r.target,
                    r.is_static, r.mode, r.requires_runtime_analysis,
                ])
            }),
        FactRow::ExceptionFlow(r) => conn
            .prepare_cached(
                "INSERT INTO exception_flows (file, line, in_function, kind, exception_type)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.in_function, r.kind, r.exception_type])
            }),
        FactRow::PropertyAccessor(r) => conn
            .prepare_cached(
                "INSERT INTO property_accessors (file, line, class_name, name, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.class_name, r.name, r.kind])
            }),
        FactRow::GeneratorYield(r) => conn
            .prepare_cached(
                "INSERT INTO generator_yields (file, line, in_function, expression, is_delegated)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .and_then(|mut s| {
                s.execute(params![r.file, r.line, r.in_function, r.expression, r.is_delegated])
            }),
        FactRow::LoopMetric(r) => conn
            .prepare_cached(
                "INSERT INTO loop_metrics (file, line, in_function, kind, depth, has_early_exit)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.in_function, r.kind, r.depth, r.has_early_exit,
                ])
            }),
        FactRow::DepManifest(r) => conn
            .prepare_cached(
                "INSERT INTO dep_manifests
                 (file, line, package_manager, name, version, build_system)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.package_manager, r.name, r.version, r.build_system,
                ])
            }),
        FactRow::DepEntry(r) => conn
            .prepare_cached(
                "INSERT INTO dep_entries
                 (file, line, package_manager, name, spec, group_name, is_optional)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.package_manager, r.name, r.spec,
                    r.group_name, r.is_optional,
                ])
            }),
        FactRow::TaintFlow(r) => conn
            .prepare_cached(
                "INSERT INTO taint_flows
                 (file, line, source_expression, sink_file, sink_line, sink_expression,
                  sink_kind, call_stack, depth, requires_runtime_analysis)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.source_expression, r.sink_file, r.sink_line,
                    r.sink_expression, r.sink_kind, r.call_stack, r.depth,
                    r.requires_runtime_analysis,
                ])
            }),
        FactRow::Finding(r) => conn
            .prepare_cached(
                "INSERT INTO findings (file, line, rule_id, severity, message, evidence, analyzer)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .and_then(|mut s| {
                s.execute(params![
                    r.file, r.line, r.rule_id, r.severity, r.message, r.evidence, r.analyzer,
                ])
            }),
    };

    result.map(|_| ()).map_err(|e| map_err(e, row))
}

/// Insert a batch of rows inside one transaction.
pub fn insert_rows(conn: &Connection, rows: &[FactRow]) -> Result<usize, StorageError> {
    conn.execute_batch("BEGIN")
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    for row in rows {
        if let Err(e) = insert_row(conn, row) {
            let _ = conn.execute_batch("ROLLBACK");
            return Err(e);
        }
    }
    conn.execute_batch("COMMIT")
        .map_err(|e| StorageError::SqliteError { message: e.to_string() })?;
    Ok(rows.len())
}
