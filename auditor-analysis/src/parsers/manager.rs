//! ParserManager — routes sources to the correct tree-sitter grammar.
//!
//! Parsers are constructed per call: `tree_sitter::Parser` is `!Sync`
//! and the extraction workers parse concurrently.

use auditor_core::errors::ParseError;
use auditor_core::types::identifiers::content_hash;

use crate::scanner::language_detect::Language;

use super::cache::ParseCache;
use super::tree::ParsedTree;

/// Manages grammar selection and the parse cache.
pub struct ParserManager {
    cache: ParseCache,
}

impl ParserManager {
    pub fn new() -> Self {
        Self {
            cache: ParseCache::default(),
        }
    }

    pub fn with_cache_capacity(capacity: u64) -> Self {
        Self {
            cache: ParseCache::new(capacity),
        }
    }

    /// Whether a language has an AST grammar. Svelte component files are
    /// indexed by path shape only; their server modules are TS/JS.
    pub fn supports(lang: Language) -> bool {
        !matches!(lang, Language::Svelte)
    }

    /// Parse a source buffer with a known language, using the cache.
    pub fn parse(
        &self,
        source: &[u8],
        file: &str,
        lang: Language,
    ) -> Result<ParsedTree, ParseError> {
        let grammar = match lang {
            Language::Python => tree_sitter_python::LANGUAGE,
            Language::JavaScript => tree_sitter_javascript::LANGUAGE,
            Language::TypeScript => {
                if file.ends_with(".tsx") {
                    tree_sitter_typescript::LANGUAGE_TSX
                } else {
                    tree_sitter_typescript::LANGUAGE_TYPESCRIPT
                }
            }
            Language::Svelte => {
                return Err(ParseError::UnsupportedLanguage {
                    extension: "svelte".to_string(),
                })
            }
        };

        // Extractors slice node text as UTF-8; reject binary upfront.
        if std::str::from_utf8(source).is_err() {
            return Err(ParseError::InvalidEncoding { file: file.to_string() });
        }

        let hash = content_hash(source);
        if let Some(cached) = self.cache.get(hash, lang) {
            return Ok(cached);
        }

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&grammar.into())
            .map_err(|_| ParseError::TreeUnavailable { file: file.to_string() })?;

        let tree = parser
            .parse(source, None)
            .ok_or_else(|| ParseError::TreeUnavailable { file: file.to_string() })?;

        let error_count = count_errors(tree.root_node());
        let parsed = ParsedTree::new(tree, lang, error_count);
        self.cache.insert(hash, lang, parsed.clone());
        Ok(parsed)
    }

    pub fn cache_entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ParserManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Count ERROR and MISSING nodes in a tree.
fn count_errors(root: tree_sitter::Node<'_>) -> usize {
    if !root.has_error() {
        return 0;
    }
    let mut count = 0;
    let mut cursor = root.walk();
    let mut reached_root = false;
    while !reached_root {
        let node = cursor.node();
        if node.is_error() || node.is_missing() {
            count += 1;
        }
        if cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                reached_root = true;
                break;
            }
        }
    }
    count
}
