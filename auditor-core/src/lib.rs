//! # auditor-core
//!
//! Foundation crate for the Auditor analysis engine.
//! Defines fact-table identifiers and row types, the error taxonomy,
//! configuration, cancellation, and the read-only storage traits.
//! Every other crate in the workspace depends on this.

pub mod cancel;
pub mod config;
pub mod errors;
pub mod facts;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use cancel::CancelToken;
pub use config::AuditorConfig;
pub use errors::error_code::AuditorErrorCode;
pub use facts::staging::FileFacts;
pub use facts::tables::{TableId, TABLE_COUNT};
pub use types::collections::{FxHashMap, FxHashSet};
pub use types::identifiers::symbol_id;
