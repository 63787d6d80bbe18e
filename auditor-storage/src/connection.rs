//! Connection management: one write connection, a small read pool,
//! WAL mode and pragmas applied on open.
//!
//! The store lives for one run. `open` deletes any stale database file
//! first — there is no migration layer, the schema is recreated.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use auditor_core::errors::StorageError;
use rusqlite::{Connection, OpenFlags};

use crate::schema;

const READ_POOL_SIZE: usize = 4;

fn sqe(e: impl std::fmt::Display) -> StorageError {
    StorageError::SqliteError { message: e.to_string() }
}

/// Owns all connections to one Fact Store database.
pub struct DatabaseManager {
    path: Option<PathBuf>,
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    next_reader: AtomicUsize,
}

impl DatabaseManager {
    /// Create a fresh file-backed store, replacing any previous run's file.
    pub fn create(path: &Path) -> Result<Self, StorageError> {
        if path.exists() {
            std::fs::remove_file(path).map_err(sqe)?;
        }
        // WAL sidecars from a crashed run
        for suffix in ["-wal", "-shm"] {
            let mut sidecar = path.as_os_str().to_owned();
            sidecar.push(suffix);
            let _ = std::fs::remove_file(PathBuf::from(sidecar));
        }

        let writer = Connection::open(path).map_err(sqe)?;
        apply_pragmas(&writer)?;
        schema::create_all(&writer)?;

        let mut readers = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(sqe)?;
            readers.push(Mutex::new(conn));
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Open an existing store read-heavy (for `analyze`/`taint` against a
    /// previously built index). Validates the schema contract on open.
    pub fn open_existing(path: &Path) -> Result<Self, StorageError> {
        let writer = Connection::open(path).map_err(sqe)?;
        apply_pragmas(&writer)?;
        schema::validate(&writer)?;

        let mut readers = Vec::with_capacity(READ_POOL_SIZE);
        for _ in 0..READ_POOL_SIZE {
            let conn = Connection::open_with_flags(
                path,
                OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(sqe)?;
            readers.push(Mutex::new(conn));
        }

        Ok(Self {
            path: Some(path.to_path_buf()),
            writer: Mutex::new(writer),
            readers,
            next_reader: AtomicUsize::new(0),
        })
    }

    /// In-memory store for tests. Reads and writes share one connection.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let writer = Connection::open_in_memory().map_err(sqe)?;
        schema::create_all(&writer)?;
        Ok(Self {
            path: None,
            writer: Mutex::new(writer),
            readers: Vec::new(),
            next_reader: AtomicUsize::new(0),
        })
    }

    /// Open an extra connection for the batch-writer thread.
    /// In-memory stores have no second connection; the batch path shares
    /// the writer there (callers fall back to `with_writer`).
    pub fn open_batch_connection(&self) -> Result<Option<Connection>, StorageError> {
        match &self.path {
            Some(path) => {
                let conn = Connection::open(path).map_err(sqe)?;
                apply_pragmas(&conn)?;
                Ok(Some(conn))
            }
            None => Ok(None),
        }
    }

    pub fn with_reader<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        if self.readers.is_empty() {
            let guard = self.writer.lock().map_err(|_| StorageError::DbBusy)?;
            return f(&guard);
        }
        let idx = self.next_reader.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let guard = self.readers[idx].lock().map_err(|_| StorageError::DbBusy)?;
        f(&guard)
    }

    pub fn with_writer<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> Result<T, StorageError>,
    {
        let guard = self.writer.lock().map_err(|_| StorageError::DbBusy)?;
        f(&guard)
    }

    /// WAL checkpoint (no-op for in-memory stores).
    pub fn checkpoint(&self) -> Result<(), StorageError> {
        if self.path.is_none() {
            return Ok(());
        }
        self.with_writer(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)").map_err(sqe)
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn apply_pragmas(conn: &Connection) -> Result<(), StorageError> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA foreign_keys = ON;
         PRAGMA busy_timeout = 5000;",
    )
    .map_err(sqe)
}
