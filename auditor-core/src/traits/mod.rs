//! Cross-crate trait seams.

pub mod storage;

pub use storage::{IFactReader, IOutputSink};
