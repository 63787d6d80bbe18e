//! JavaScript / TypeScript extractor.
//!
//! Same shape as the Python root: one `extract` entry point, explicit
//! sub-module calls, framework passes gated on an in-file signal or the
//! project tag.

pub mod core;
pub mod dataflow;
pub mod express;

use auditor_core::errors::ContractViolation;
use auditor_core::facts::staging::FileFacts;

use crate::parsers::ParsedTree;
use crate::scanner::language_detect::Language;

use super::scope_map::ScopeMap;
use super::FileInfo;

pub fn extract(
    info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
) -> Result<FileFacts, ContractViolation> {
    let scopes = ScopeMap::build(tree.root(), content, Language::JavaScript);
    let mut facts = FileFacts::new();

    core::extract(info, content, tree, &scopes, &mut facts)?;
    dataflow::extract(info, content, tree, &scopes, &mut facts)?;

    if express::gate(info, content) {
        express::extract(info, content, tree, &scopes, &mut facts)?;
    }

    Ok(facts)
}
