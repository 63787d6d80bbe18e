//! The parsed-tree wrapper handed to extractors.
//!
//! Extractors never receive a raw tree-sitter node: they get this
//! wrapper and go through `root()`. The indirection keeps parser
//! internals out of extractor signatures.

use crate::scanner::language_detect::Language;

/// An opaque wrapper around one file's parse.
#[derive(Debug, Clone)]
pub struct ParsedTree {
    tree: tree_sitter::Tree,
    language: Language,
    /// Count of ERROR/MISSING nodes observed during parse.
    error_count: usize,
}

impl ParsedTree {
    pub(crate) fn new(tree: tree_sitter::Tree, language: Language, error_count: usize) -> Self {
        Self {
            tree,
            language,
            error_count,
        }
    }

    /// The root AST node — the documented accessor.
    pub fn root(&self) -> tree_sitter::Node<'_> {
        self.tree.root_node()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}
