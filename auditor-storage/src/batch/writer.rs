//! Dedicated writer thread with crossbeam-channel bounded(1024).
//!
//! The writer is the single mutator of the Fact Store during indexing.
//! Buffered rows are grouped by table and committed in the declared
//! flush order, so referenced-entity tables always land before their
//! referrers inside a flush.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::FactRow;
use auditor_core::facts::tables::TableId;
use auditor_core::types::collections::FxHashMap;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use rusqlite::Connection;

use crate::insert;

use super::commands::{render_err, BatchCommand};

const CHANNEL_BOUND: usize = 1024;
const BATCH_SIZE: usize = 500;
const FLUSH_TIMEOUT: Duration = Duration::from_millis(100);

/// Statistics from the batch writer: rows committed per table.
#[derive(Debug, Default, Clone)]
pub struct WriteStats {
    pub rows_per_table: FxHashMap<TableId, usize>,
    pub flushes: usize,
}

impl WriteStats {
    pub fn total_rows(&self) -> usize {
        self.rows_per_table.values().sum()
    }
}

/// A batch writer that accepts commands via a channel and writes them
/// in flush-ordered transactions on a dedicated thread.
pub struct BatchWriter {
    tx: Sender<BatchCommand>,
    handle: Option<JoinHandle<Result<WriteStats, StorageError>>>,
}

impl BatchWriter {
    /// Spawn the writer thread. The `conn` moves to the thread.
    pub fn new(conn: Connection) -> Self {
        let (tx, rx) = bounded(CHANNEL_BOUND);

        let handle = thread::Builder::new()
            .name("auditor-batch-writer".to_string())
            .spawn(move || writer_loop(conn, rx))
            .expect("failed to spawn batch writer thread");

        Self { tx, handle: Some(handle) }
    }

    pub fn send(&self, cmd: BatchCommand) -> Result<(), StorageError> {
        self.tx.send(cmd).map_err(|_| StorageError::SqliteError {
            message: "batch writer channel disconnected".to_string(),
        })
    }

    /// Flush pending writes (does NOT wait for completion).
    pub fn flush(&self) -> Result<(), StorageError> {
        self.send(BatchCommand::Flush)
    }

    /// Flush pending writes and block until committed.
    pub fn flush_sync(&self) -> Result<(), StorageError> {
        let (tx, rx) = std::sync::mpsc::sync_channel(0);
        self.send(BatchCommand::FlushSync(tx))?;
        match rx.recv() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(message)) => Err(StorageError::SqliteError { message }),
            Err(_) => Err(StorageError::SqliteError {
                message: "batch writer thread did not respond to flush_sync".to_string(),
            }),
        }
    }

    /// Shut down the writer thread and wait for completion.
    pub fn shutdown(mut self) -> Result<WriteStats, StorageError> {
        let _ = self.tx.send(BatchCommand::Shutdown);
        if let Some(handle) = self.handle.take() {
            handle.join().map_err(|_| StorageError::SqliteError {
                message: "batch writer thread panicked".to_string(),
            })?
        } else {
            Ok(WriteStats::default())
        }
    }
}

impl Drop for BatchWriter {
    fn drop(&mut self) {
        let _ = self.tx.send(BatchCommand::Shutdown);
    }
}

fn writer_loop(
    conn: Connection,
    rx: Receiver<BatchCommand>,
) -> Result<WriteStats, StorageError> {
    let mut buffer: FxHashMap<TableId, Vec<FactRow>> = FxHashMap::default();
    let mut buffered = 0usize;
    let mut stats = WriteStats::default();

    loop {
        match rx.recv_timeout(FLUSH_TIMEOUT) {
            Ok(BatchCommand::Shutdown) => {
                flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats)?;
                break;
            }
            Ok(BatchCommand::Flush) => {
                flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats)?;
            }
            Ok(BatchCommand::FlushSync(done_tx)) => {
                let result = flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats);
                match result {
                    Ok(()) => {
                        let _ = done_tx.send(Ok(()));
                    }
                    Err(e) => {
                        let _ = done_tx.send(Err(render_err(&e)));
                        return Err(e);
                    }
                }
            }
            Ok(BatchCommand::Write { table, rows }) => {
                buffered += rows.len();
                buffer.entry(table).or_default().extend(rows);
                if buffered >= BATCH_SIZE {
                    flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats)?;
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats)?;
            }
            Err(RecvTimeoutError::Disconnected) => {
                flush_buffer(&conn, &mut buffer, &mut buffered, &mut stats)?;
                break;
            }
        }
    }

    Ok(stats)
}

/// Commit all buffered rows in one transaction, tables in declared
/// flush order.
fn flush_buffer(
    conn: &Connection,
    buffer: &mut FxHashMap<TableId, Vec<FactRow>>,
    buffered: &mut usize,
    stats: &mut WriteStats,
) -> Result<(), StorageError> {
    if *buffered == 0 {
        return Ok(());
    }

    let mut ordered: Vec<FactRow> = Vec::with_capacity(*buffered);
    for table in TableId::FLUSH_ORDER {
        if let Some(rows) = buffer.remove(table) {
            *stats.rows_per_table.entry(*table).or_default() += rows.len();
            ordered.extend(rows);
        }
    }
    *buffered = 0;

    insert::insert_rows(conn, &ordered)?;
    stats.flushes += 1;
    tracing::debug!(rows = ordered.len(), "batch flushed");
    Ok(())
}
