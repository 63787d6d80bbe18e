//! Inter-procedural, call-stack-sensitive taint propagation.
//!
//! Two stages per candidate source: Stage A is a flow-insensitive
//! worklist over argument passing and return flow; Stage B re-derives
//! the same flows flow-sensitively against each function's CFG, falling
//! back to Stage A semantics where CFG metadata is missing.
//!
//! Paths are deduplicated on `(source_site, sink_site, call_stack)` —
//! never on source and sink alone, so the same helper reached from two
//! controllers yields two findings.

pub mod engine;
pub mod index;
pub mod registry;
pub mod stage_a;
pub mod stage_b;
pub mod types;
pub mod visited;

pub use engine::TaintEngine;
pub use registry::TaintRegistry;
pub use types::{CallFrame, TaintPath, TaintReport};
