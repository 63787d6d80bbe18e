//! Cooperative cancellation.
//!
//! Checked at unit boundaries only: after a file, after a batch flush,
//! between worklist iterations. A cancelled run drains in-flight buffers
//! and produces a partial report flagged `cancelled=true`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }

    /// Raw atomic for handing to walkers that take `&AtomicBool`.
    pub fn as_atomic(&self) -> &AtomicBool {
        &self.flag
    }
}
