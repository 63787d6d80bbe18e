//! Per-language extractors.
//!
//! Each language has one root `extract()` — a sequence of explicit calls
//! into sub-modules, one per conceptual domain. Wiring is by direct
//! function reference; there is no reflective registry. Sub-modules are
//! self-contained and may duplicate small helpers (string unwrapping,
//! keyword-argument lookup) rather than share them.
//!
//! Contract per extractor:
//! - input is `(&FileInfo, &[u8], &ParsedTree)` — never a raw AST node;
//! - output rows never carry the canonical `file` column (the normalizer
//!   injects it);
//! - `line` is the construct's starting line, 1-based;
//! - output is deduplicated by primary-key projection before return,
//!   because AST walkers may visit a node more than once.

pub mod javascript;
pub mod python;
pub mod scope_map;
pub mod sveltekit;

use std::path::PathBuf;

use auditor_core::errors::ContractViolation;
use auditor_core::facts::staging::FileFacts;

use crate::parsers::ParsedTree;
use crate::scanner::language_detect::Language;

/// What an extractor knows about the file it is walking.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Project-relative path, forward slashes; used only for framework
    /// gating (route shapes) — never written into rows.
    pub relative_path: String,
    pub language: Language,
    /// Advisory framework tags from the project-level detector.
    pub framework_tags: Vec<String>,
}

impl FileInfo {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.framework_tags.iter().any(|t| t == tag)
    }
}

/// Dispatch a parsed file to its language's root extractor.
///
/// `tree` is absent for languages without a grammar (Svelte components);
/// their facts come from path shape alone.
pub fn extract_file(
    info: &FileInfo,
    content: &[u8],
    tree: Option<&ParsedTree>,
) -> Result<FileFacts, ContractViolation> {
    let mut facts = match (info.language, tree) {
        (Language::Python, Some(tree)) => python::extract(info, content, tree)?,
        (Language::JavaScript | Language::TypeScript, Some(tree)) => {
            javascript::extract(info, content, tree)?
        }
        _ => FileFacts::new(),
    };

    // File-system routing is a path-shape concern, layered on top of
    // whatever language extraction produced.
    if sveltekit::gate(info) {
        sveltekit::extract(info, content, tree, &mut facts)?;
    }

    facts.dedup();
    Ok(facts)
}
