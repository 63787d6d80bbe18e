//! Analyzer framework tests: determinism, ordering, rule behavior.

use auditor_analysis::analyzers::{registry, run_all};
use auditor_core::cancel::CancelToken;
use auditor_core::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, FactRow, FileRow, SymbolRow,
};
use auditor_core::facts::tables::TableId;
use auditor_storage::FactStore;

fn seed(store: &FactStore) {
    store
        .write_rows(
            TableId::Files,
            vec![FactRow::File(FileRow {
                path: "app.py".into(),
                language: "python".into(),
                content_hash: 1,
                file_size: 10,
                framework_tags: String::new(),
                parse_status: "ok".into(),
                parse_error: String::new(),
            })],
        )
        .unwrap();
    store
        .write_rows(
            TableId::Symbols,
            vec![FactRow::Symbol(SymbolRow {
                file: "app.py".into(),
                line: 1,
                end_line: 20,
                kind: "function".into(),
                name: "build".into(),
                qualified_name: "build".into(),
                scope: "global".into(),
                params: "[\"name\"]".into(),
                symbol_id: 1,
            })],
        )
        .unwrap();
    store
        .write_rows(
            TableId::Assignments,
            vec![FactRow::Assignment(AssignmentRow {
                file: "app.py".into(),
                line: 3,
                in_function: "build".into(),
                target: "query".into(),
                expression: "\"SELECT * FROM users WHERE name = \" + name".into(),
                read_vars: "[\"name\"]".into(),
            })],
        )
        .unwrap();
    store
        .write_rows(
            TableId::Calls,
            vec![FactRow::Call(CallRow {
                file: "app.py".into(),
                line: 7,
                caller_function: "build".into(),
                callee_name: "run".into(),
                receiver: "subprocess".into(),
                argument_count: 2,
                callee_unresolved: false,
                requires_runtime_analysis: false,
            })],
        )
        .unwrap();
    store
        .write_rows(
            TableId::CallArgs,
            vec![
                FactRow::CallArg(CallArgRow {
                    file: "app.py".into(),
                    line: 7,
                    callee_name: "run".into(),
                    arg_index: 0,
                    keyword: String::new(),
                    expression: "cmd".into(),
                    read_vars: "[\"cmd\"]".into(),
                }),
                FactRow::CallArg(CallArgRow {
                    file: "app.py".into(),
                    line: 7,
                    callee_name: "run".into(),
                    arg_index: 1,
                    keyword: "shell".into(),
                    expression: "True".into(),
                    read_vars: "[]".into(),
                }),
            ],
        )
        .unwrap();
}

#[test]
fn builtin_rules_fire_and_order_is_stable() {
    let store = FactStore::open_in_memory().unwrap();
    seed(&store);

    let cancel = CancelToken::new();
    let first = run_all(&store, &registry::builtin(), &cancel);
    let second = run_all(&store, &registry::builtin(), &cancel);

    assert!(first.failed.is_empty());
    assert!(!first.findings.is_empty());

    // sql-string-build catches the concatenated query.
    assert!(first
        .findings
        .iter()
        .any(|f| f.rule_id == "sql-string-build" && f.line == 3));
    // shell-exec catches subprocess.run(..., shell=True).
    assert!(first
        .findings
        .iter()
        .any(|f| f.rule_id == "shell-exec" && f.line == 7));

    // Deterministic output, sorted by (rule_id, file, line).
    let key =
        |f: &auditor_core::facts::rows::FindingRow| (f.rule_id.clone(), f.file.clone(), f.line);
    let firsts: Vec<_> = first.findings.iter().map(key).collect();
    let seconds: Vec<_> = second.findings.iter().map(key).collect();
    assert_eq!(firsts, seconds);
    let mut sorted = firsts.clone();
    sorted.sort();
    assert_eq!(firsts, sorted);
}

#[test]
fn cancelled_run_is_flagged() {
    let store = FactStore::open_in_memory().unwrap();
    seed(&store);

    let cancel = CancelToken::new();
    cancel.cancel();
    let report = run_all(&store, &registry::builtin(), &cancel);
    assert!(report.cancelled);
    assert!(report.findings.is_empty());
}
