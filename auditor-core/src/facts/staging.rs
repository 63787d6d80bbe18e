//! Per-file staging buffers.
//!
//! Each extraction worker owns one `FileFacts` per file. Rows accumulate
//! here, are deduplicated by primary-key projection (AST walkers may visit
//! the same node more than once), and are handed to the normalizer for
//! canonicalization and flush. No worker ever touches the store directly.

use crate::errors::contract_violation::ContractViolation;
use crate::types::collections::{FxHashMap, FxHashSet};

use super::rows::FactRow;
use super::tables::TableId;

/// Staging buffer for one source file: `table → rows`.
#[derive(Debug, Default)]
pub struct FileFacts {
    tables: FxHashMap<TableId, Vec<FactRow>>,
}

impl FileFacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row to its table's buffer.
    ///
    /// Fails with `ForbiddenFileColumn` if the extractor already populated
    /// the canonical `file` column — that injection belongs to the
    /// normalizer alone.
    pub fn push(&mut self, row: FactRow) -> Result<(), ContractViolation> {
        if !row.file().is_empty() {
            return Err(ContractViolation::ForbiddenFileColumn {
                table: row.table().name().to_string(),
                file: row.file().to_string(),
            });
        }
        self.tables.entry(row.table()).or_default().push(row);
        Ok(())
    }

    /// Append a row whose identity IS a path (the `files` table only).
    pub fn push_file_row(&mut self, row: FactRow) -> Result<(), ContractViolation> {
        match row.table() {
            TableId::Files => {
                self.tables.entry(TableId::Files).or_default().push(row);
                Ok(())
            }
            other => Err(ContractViolation::UnknownTable {
                table: format!("push_file_row used for {}", other.name()),
            }),
        }
    }

    /// Deduplicate every table's rows by primary-key projection,
    /// keeping the first occurrence. Returns rows dropped per table.
    pub fn dedup(&mut self) -> FxHashMap<TableId, usize> {
        let mut dropped = FxHashMap::default();
        for (table, rows) in self.tables.iter_mut() {
            let before = rows.len();
            let mut seen: FxHashSet<String> = FxHashSet::default();
            rows.retain(|row| seen.insert(row.primary_key()));
            let removed = before - rows.len();
            if removed > 0 {
                dropped.insert(*table, removed);
            }
        }
        dropped
    }

    /// Merge another buffer into this one (used by sub-extractor passes).
    pub fn merge(&mut self, other: FileFacts) {
        for (table, rows) in other.tables {
            self.tables.entry(table).or_default().extend(rows);
        }
    }

    /// Total row count across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Rows staged for one table.
    pub fn rows(&self, table: TableId) -> &[FactRow] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate `(table, rows)` pairs in registry order for deterministic
    /// downstream processing.
    pub fn iter_ordered(&self) -> impl Iterator<Item = (TableId, &[FactRow])> + '_ {
        TableId::ALL
            .iter()
            .filter_map(move |t| self.tables.get(t).map(|rows| (*t, rows.as_slice())))
    }

    /// Consume the buffer, yielding tables in registry order.
    pub fn into_ordered(mut self) -> Vec<(TableId, Vec<FactRow>)> {
        let mut out = Vec::new();
        for t in TableId::ALL {
            if let Some(rows) = self.tables.remove(t) {
                if !rows.is_empty() {
                    out.push((*t, rows));
                }
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.tables.values().all(Vec::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::rows::{AssignmentRow, FactRow};

    fn assignment(line: u32, target: &str) -> FactRow {
        FactRow::Assignment(AssignmentRow {
            file: String::new(),
            line,
            in_function: "f".into(),
            target: target.into(),
            expression: "x".into(),
            read_vars: "[\"x\"]".into(),
        })
    }

    #[test]
    fn push_rejects_prepopulated_file() {
        let mut facts = FileFacts::new();
        let mut row = assignment(3, "y");
        row.set_file("src/app.py");
        assert!(facts.push(row).is_err());
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut facts = FileFacts::new();
        facts.push(assignment(3, "y")).unwrap();
        facts.push(assignment(3, "y")).unwrap();
        facts.push(assignment(4, "y")).unwrap();
        let dropped = facts.dedup();
        assert_eq!(dropped.get(&TableId::Assignments), Some(&1));
        assert_eq!(facts.rows(TableId::Assignments).len(), 2);
    }
}
