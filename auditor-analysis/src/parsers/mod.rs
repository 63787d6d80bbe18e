//! Tree-sitter parser management.

pub mod cache;
pub mod manager;
pub mod tree;

pub use manager::ParserManager;
pub use tree::ParsedTree;
