//! Commands accepted by the batch-writer thread.

use std::sync::mpsc::SyncSender;

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::FactRow;
use auditor_core::facts::tables::TableId;

/// A command for the writer thread.
pub enum BatchCommand {
    /// Append rows for one table. Rows must already carry their canonical
    /// `file` column — only the normalizer constructs these.
    Write { table: TableId, rows: Vec<FactRow> },
    /// Commit buffered rows now (fire-and-forget).
    Flush,
    /// Commit buffered rows and acknowledge over the channel.
    FlushSync(SyncSender<Result<(), String>>),
    /// Flush and exit the writer loop.
    Shutdown,
}

impl BatchCommand {
    pub fn write(table: TableId, rows: Vec<FactRow>) -> Self {
        Self::Write { table, rows }
    }
}

/// Writer-side error rendered for the acknowledge channel.
pub fn render_err(e: &StorageError) -> String {
    e.to_string()
}
