//! Index determinism, empty-tree behavior, and parse-failure isolation.

use std::path::Path;

use auditor_analysis::pipeline::{run_analyze, run_index, run_taint};
use auditor_core::cancel::CancelToken;
use auditor_core::config::AuditorConfig;
use auditor_core::facts::tables::TABLE_COUNT;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn seed_project(root: &Path) {
    write(
        root,
        "app.py",
        "\
import sqlalchemy
from sqlalchemy import Column, Integer

class Item(Base):
    __tablename__ = 'items'
    id = Column(Integer, primary_key=True)

def handler(request):
    q = request.args.get('q')
    cursor.execute(q)
    return q
",
    );
    write(
        root,
        "src/routes/account/+page.svelte",
        "<h1>account</h1>",
    );
    write(
        root,
        "requirements.txt",
        "flask>=3.0\nsqlalchemy>=2.0\n",
    );
}

/// Re-running `index` on an unchanged tree produces bit-identical
/// per-table row counts.
#[test]
fn repeated_index_is_deterministic() {
    let tmp = tempfile::tempdir().unwrap();
    seed_project(tmp.path());
    let config = AuditorConfig::default();
    let cancel = CancelToken::new();

    let first = run_index(tmp.path(), &config, &cancel).unwrap();
    let second = run_index(tmp.path(), &config, &cancel).unwrap();

    assert_eq!(first.receipt.tables, second.receipt.tables);
    assert!(first.receipt.total_rows() > 0);
    assert_eq!(first.receipt.tables.len(), TABLE_COUNT);
}

/// An empty source tree indexes to a store with every declared table
/// present and zero rows; analyze and taint run without error.
#[test]
fn empty_tree_yields_empty_but_valid_store() {
    let tmp = tempfile::tempdir().unwrap();
    let config = AuditorConfig::default();
    let cancel = CancelToken::new();

    let outcome = run_index(tmp.path(), &config, &cancel).unwrap();
    assert_eq!(outcome.receipt.tables.len(), TABLE_COUNT);
    assert_eq!(outcome.receipt.total_rows(), 0);
    assert!(outcome.parse_failures.is_empty());

    let analyze = run_analyze(tmp.path(), &cancel).unwrap();
    assert!(analyze.findings.is_empty());
    assert!(analyze.failed.is_empty());

    let taint = run_taint(tmp.path(), &config, &cancel).unwrap();
    assert!(taint.paths.is_empty());
    assert!(tmp.path().join(".pf/taint_analysis.json").exists());
}

/// A file whose parse fails contributes zero fact rows, surfaces a
/// failure record, and leaves other files untouched.
#[test]
fn parse_failure_is_isolated() {
    let tmp = tempfile::tempdir().unwrap();
    write(tmp.path(), "good.py", "def ok():\n    return 1\n");
    // Invalid UTF-8 forces a parse-level failure for this file.
    std::fs::write(tmp.path().join("bad.py"), [0xff, 0xfe, 0x00, 0x9f]).unwrap();

    let config = AuditorConfig::default();
    let cancel = CancelToken::new();
    let outcome = run_index(tmp.path(), &config, &cancel).unwrap();

    assert_eq!(outcome.parse_failures.len(), 1);
    assert_eq!(outcome.parse_failures[0].0, "bad.py");
    // The good file still contributed symbols.
    assert!(outcome.receipt.tables["symbols"] >= 1);
    // Both files have a files row; the bad one is marked failed.
    assert_eq!(outcome.receipt.tables["files"], 2);
}

/// Receipts are snapshotted under `.pf/history/`.
#[test]
fn receipt_history_is_written() {
    let tmp = tempfile::tempdir().unwrap();
    seed_project(tmp.path());
    let config = AuditorConfig::default();
    let cancel = CancelToken::new();
    run_index(tmp.path(), &config, &cancel).unwrap();

    assert!(tmp.path().join(".pf/receipt.json").exists());
    let history: Vec<_> = std::fs::read_dir(tmp.path().join(".pf/history"))
        .unwrap()
        .collect();
    assert!(!history.is_empty());
}

/// The full pipeline over a seeded project finds the handler's taint
/// path end to end.
#[test]
fn full_pipeline_finds_taint_path() {
    let tmp = tempfile::tempdir().unwrap();
    seed_project(tmp.path());
    let config = AuditorConfig::default();
    let cancel = CancelToken::new();

    run_index(tmp.path(), &config, &cancel).unwrap();
    let report = run_taint(tmp.path(), &config, &cancel).unwrap();

    assert!(
        !report.paths.is_empty(),
        "request.args → cursor.execute should be found"
    );
    let path = &report.paths[0];
    assert_eq!(path.source.function, "handler");
    assert_eq!(path.sink.kind, "sql");
    assert!(!path.call_stack.is_empty());
}
