//! # auditor-analysis
//!
//! Analysis engine for the Auditor platform: scanner, tree-sitter
//! parsers, per-language extractors, normalizer, framework detection,
//! stateless analyzers, and the two-stage taint engine.

pub mod analyzers;
pub mod extract;
pub mod frameworks;
pub mod graph;
pub mod normalize;
pub mod parsers;
pub mod pipeline;
pub mod scanner;
