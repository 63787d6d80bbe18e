//! Fact Store contract tests: registry enforcement, flush ordering,
//! batch writes, receipts.

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::rows::{FactRow, FileRow, SymbolRow};
use auditor_core::facts::tables::{TableId, TABLE_COUNT};
use auditor_core::traits::storage::IFactReader;
use auditor_storage::{FactStore, Receipt};

fn file_row(path: &str) -> FactRow {
    FactRow::File(FileRow {
        path: path.to_string(),
        language: "python".to_string(),
        content_hash: 7,
        file_size: 42,
        framework_tags: String::new(),
        parse_status: "ok".to_string(),
        parse_error: String::new(),
    })
}

fn symbol_row(file: &str, name: &str, line: u32) -> FactRow {
    FactRow::Symbol(SymbolRow {
        file: file.to_string(),
        line,
        end_line: line + 3,
        kind: "function".to_string(),
        name: name.to_string(),
        qualified_name: name.to_string(),
        scope: "global".to_string(),
        params: "[]".to_string(),
        symbol_id: 1,
    })
}

#[test]
fn fresh_store_has_every_declared_table() {
    let store = FactStore::open_in_memory().unwrap();
    store.validate().unwrap();
    let receipt = store.receipt().unwrap();
    assert_eq!(receipt.tables.len(), TABLE_COUNT);
    assert_eq!(receipt.total_rows(), 0);
}

#[test]
fn unknown_table_write_is_fatal() {
    let store = FactStore::open_in_memory().unwrap();
    let err = store.write_batch("not_a_table", Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Contract(ContractViolation::UnknownTable { .. })
    ));
}

#[test]
fn row_routed_to_wrong_table_is_fatal() {
    let store = FactStore::open_in_memory().unwrap();
    let err = store
        .write_rows(TableId::Calls, vec![symbol_row("a.py", "f", 1)])
        .unwrap_err();
    assert!(matches!(err, StorageError::Contract(_)));
}

#[test]
fn file_backed_store_batches_through_the_writer_thread() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("repo_index.db");
    let store = FactStore::create(&db).unwrap();

    store
        .write_rows(TableId::Files, vec![file_row("src/a.py"), file_row("src/b.py")])
        .unwrap();
    store
        .write_rows(
            TableId::Symbols,
            vec![symbol_row("src/a.py", "f", 1), symbol_row("src/a.py", "g", 9)],
        )
        .unwrap();
    store.flush_sync().unwrap();

    assert_eq!(store.count_rows(TableId::Files).unwrap(), 2);
    assert_eq!(store.count_rows(TableId::Symbols).unwrap(), 2);

    let symbols = store.symbols_by_file("src/a.py").unwrap();
    assert_eq!(symbols.len(), 2);
    assert_eq!(symbols[0].name, "f");
}

#[test]
fn recreate_replaces_previous_run() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("repo_index.db");

    {
        let store = FactStore::create(&db).unwrap();
        store
            .write_rows(TableId::Files, vec![file_row("src/a.py")])
            .unwrap();
        store.flush_sync().unwrap();
        assert_eq!(store.count_rows(TableId::Files).unwrap(), 1);
    }

    let store = FactStore::create(&db).unwrap();
    assert_eq!(store.count_rows(TableId::Files).unwrap(), 0);
    store.validate().unwrap();
}

#[test]
fn open_existing_validates_schema() {
    let tmp = tempfile::tempdir().unwrap();
    let db = tmp.path().join("repo_index.db");
    {
        let store = FactStore::create(&db).unwrap();
        store.flush_sync().unwrap();
    }
    let reopened = FactStore::open_existing(&db).unwrap();
    assert_eq!(reopened.count_rows(TableId::Files).unwrap(), 0);
}

#[test]
fn receipt_reconciles_flushed_counts() {
    let store = FactStore::open_in_memory().unwrap();
    store
        .write_rows(TableId::Files, vec![file_row("src/a.py")])
        .unwrap();
    let receipt = store.receipt().unwrap();

    let mut flushed = std::collections::BTreeMap::new();
    flushed.insert("files".to_string(), 1usize);
    receipt.reconcile(&flushed).unwrap();

    flushed.insert("files".to_string(), 5usize);
    let err = receipt.reconcile(&flushed).unwrap_err();
    assert!(matches!(
        err,
        StorageError::Contract(ContractViolation::RowCountMismatch { .. })
    ));
}

#[test]
fn receipt_round_trips_through_disk() {
    let tmp = tempfile::tempdir().unwrap();
    let store = FactStore::open_in_memory().unwrap();
    let receipt = store.receipt().unwrap();
    let path = tmp.path().join("receipt.json");
    receipt.write(&path).unwrap();
    let loaded = Receipt::load(&path).unwrap();
    assert_eq!(loaded.tables, receipt.tables);
}
