//! Fact-table identifiers, row types, and per-file staging buffers.
//!
//! The table registry is closed: every table a language frontend may
//! populate is a `TableId` variant. Writes to anything else fail fast.

pub mod rows;
pub mod staging;
pub mod tables;
