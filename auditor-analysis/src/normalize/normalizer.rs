//! Flush per-file staging buffers to the Fact Store.
//!
//! The normalizer is the single writer. It canonicalizes paths, injects
//! the `file` column, assigns stable symbol ids, resolves references,
//! deduplicates across files, commits tables in declared flush order,
//! and emits the receipt.

use std::collections::BTreeMap;

use auditor_core::errors::{ContractViolation, StorageError};
use auditor_core::facts::rows::FactRow;
use auditor_core::facts::staging::FileFacts;
use auditor_core::facts::tables::TableId;
use auditor_core::types::collections::{FxHashMap, FxHashSet};
use auditor_core::types::identifiers::symbol_id;
use auditor_storage::{FactStore, Receipt};

use super::resolve::SymbolIndex;

/// Outcome of one flush.
#[derive(Debug)]
pub struct FlushOutcome {
    pub receipt: Receipt,
    /// Rows dropped by cross-file dedup, per table (non-strict mode).
    pub truncated: BTreeMap<String, usize>,
}

pub struct Normalizer {
    /// Test mode: duplicate primary keys after per-file dedup are fatal.
    strict: bool,
}

impl Normalizer {
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Normalize and flush all per-file buffers.
    ///
    /// `buffers` pairs each canonical file path with its staged facts.
    /// Paths must already be project-relative, forward-slash form — the
    /// pipeline computes them once at discovery.
    pub fn flush(
        &self,
        store: &FactStore,
        buffers: Vec<(String, FileFacts)>,
    ) -> Result<FlushOutcome, StorageError> {
        let mut tables: FxHashMap<TableId, Vec<FactRow>> = FxHashMap::default();

        // Inject the canonical path and regroup rows by table.
        for (path, facts) in buffers {
            for (table, rows) in facts.into_ordered() {
                let bucket = tables.entry(table).or_default();
                for mut row in rows {
                    if table != TableId::Files && !row.file().is_empty() {
                        return Err(ContractViolation::ForbiddenFileColumn {
                            table: table.name().to_string(),
                            file: row.file().to_string(),
                        }
                        .into());
                    }
                    row.set_file(&path);
                    bucket.push(row);
                }
            }
        }

        // Stable symbol ids, then the resolution index over them.
        let mut symbols = Vec::new();
        if let Some(rows) = tables.get_mut(&TableId::Symbols) {
            for row in rows.iter_mut() {
                if let FactRow::Symbol(sym) = row {
                    sym.symbol_id =
                        symbol_id(&sym.file, &sym.kind, &sym.qualified_name, sym.line);
                    symbols.push(sym.clone());
                }
            }
        }
        let index = SymbolIndex::build(&symbols);

        if let Some(rows) = tables.get_mut(&TableId::Refs) {
            for row in rows.iter_mut() {
                if let FactRow::Ref(reference) = row {
                    match reference.kind.as_str() {
                        "import" | "from" => index.resolve_import(reference),
                        _ => index.resolve(reference),
                    }
                }
            }
        }

        // Cross-file dedup. Silent last-writer-wins is forbidden: strict
        // mode aborts, normal mode logs and records the truncation.
        let mut truncated: BTreeMap<String, usize> = BTreeMap::new();
        for (table, rows) in tables.iter_mut() {
            let mut seen: FxHashSet<String> = FxHashSet::default();
            let before = rows.len();
            let mut duplicate_key: Option<String> = None;
            rows.retain(|row| {
                let key = row.primary_key();
                let fresh = seen.insert(key.clone());
                if !fresh && duplicate_key.is_none() {
                    duplicate_key = Some(key);
                }
                fresh
            });
            let removed = before - rows.len();
            if removed > 0 {
                if self.strict {
                    return Err(ContractViolation::DuplicatePrimaryKey {
                        table: table.name().to_string(),
                        key: duplicate_key.unwrap_or_default(),
                    }
                    .into());
                }
                tracing::warn!(
                    table = table.name(),
                    dropped = removed,
                    "cross-file duplicate primary keys truncated"
                );
                truncated.insert(table.name().to_string(), removed);
            }
        }

        // Deterministic row order within each table.
        for rows in tables.values_mut() {
            rows.sort_by(|a, b| a.primary_key().cmp(&b.primary_key()));
        }

        // Flush in declared order and reconcile the receipt.
        let mut flushed: BTreeMap<String, usize> = BTreeMap::new();
        for table in TableId::FLUSH_ORDER {
            if let Some(rows) = tables.remove(table) {
                if rows.is_empty() {
                    continue;
                }
                flushed.insert(table.name().to_string(), rows.len());
                store.write_rows(*table, rows)?;
            }
        }
        store.flush_sync()?;

        let receipt = store.receipt()?;
        receipt.reconcile(&flushed)?;

        Ok(FlushOutcome { receipt, truncated })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_core::facts::rows::{AssignmentRow, RefRow, SymbolRow};

    fn symbol(name: &str, line: u32) -> FactRow {
        FactRow::Symbol(SymbolRow {
            file: String::new(),
            line,
            end_line: line + 5,
            kind: "function".into(),
            name: name.into(),
            qualified_name: name.into(),
            scope: "global".into(),
            params: "[]".into(),
            symbol_id: 0,
        })
    }

    #[test]
    fn injects_file_and_assigns_ids() {
        let store = FactStore::open_in_memory().unwrap();
        let mut facts = FileFacts::new();
        facts.push(symbol("handler", 3)).unwrap();
        facts
            .push(FactRow::Ref(RefRow {
                file: String::new(),
                line: 9,
                name: "handler".into(),
                kind: "call".into(),
                resolution: "unresolved".into(),
                target_symbol_id: 0,
            }))
            .unwrap();

        let outcome = Normalizer::new(true)
            .flush(&store, vec![("src/app.py".into(), facts)])
            .unwrap();
        assert_eq!(outcome.receipt.tables["symbols"], 1);
        assert_eq!(outcome.receipt.tables["refs"], 1);

        use auditor_core::traits::storage::IFactReader;
        let syms = store.symbols_by_file("src/app.py").unwrap();
        assert_ne!(syms[0].symbol_id, 0);
        let refs = store.refs_by_file("src/app.py").unwrap();
        assert_eq!(refs[0].resolution, "resolved");
        assert_eq!(refs[0].target_symbol_id, syms[0].symbol_id);
    }

    #[test]
    fn strict_mode_rejects_cross_file_duplicates() {
        let store = FactStore::open_in_memory().unwrap();
        // Two files staging the same row is impossible through the
        // normal path (the key embeds the file); simulate a collision
        // within one file's buffer post-dedup via two tables merged.
        let mut a = FileFacts::new();
        a.push(FactRow::Assignment(AssignmentRow {
            file: String::new(),
            line: 1,
            in_function: "f".into(),
            target: "x".into(),
            expression: "1".into(),
            read_vars: "[]".into(),
        }))
        .unwrap();
        let mut b = FileFacts::new();
        b.push(FactRow::Assignment(AssignmentRow {
            file: String::new(),
            line: 1,
            in_function: "f".into(),
            target: "x".into(),
            expression: "2".into(),
            read_vars: "[]".into(),
        }))
        .unwrap();

        let err = Normalizer::new(true)
            .flush(
                &store,
                vec![("src/app.py".into(), a), ("src/app.py".into(), b)],
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Contract(ContractViolation::DuplicatePrimaryKey { .. })
        ));
    }
}
