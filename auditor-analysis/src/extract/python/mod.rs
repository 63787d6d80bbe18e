//! Python extractor.
//!
//! `extract` is the sole entry point: an explicit sequence of sub-module
//! calls, one per domain. Framework passes are gated on an import or
//! decorator signal (or the project-level advisory tag) so they cost
//! nothing on codebases that do not use the framework.

pub mod celery;
pub mod control_flow;
pub mod core;
pub mod dataflow;
pub mod di;
pub mod exceptions;
pub mod forms;
pub mod io_ops;
pub mod pytest;
pub mod sqlalchemy;
pub mod state_mutations;
pub mod validators;

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
    let scopes = ScopeMap::build(tree.root(), content, Language::Python);
    let mut facts = FileFacts::new();

    core::extract(info, content, tree, &scopes, &mut facts)?;
    dataflow::extract(info, content, tree, &scopes, &mut facts)?;
    control_flow::extract(info, content, tree, &scopes, &mut facts)?;
    state_mutations::extract(info, content, tree, &scopes, &mut facts)?;
    io_ops::extract(info, content, tree, &scopes, &mut facts)?;
    exceptions::extract(info, content, tree, &scopes, &mut facts)?;

    // Framework passes: gated, but a direct in-file signal always wins
    // over a missing project-level detection.
    if sqlalchemy::gate(info, content) {
        sqlalchemy::extract(info, content, tree, &mut facts)?;
    }
    if celery::gate(info, content) {
        celery::extract(info, content, tree, &scopes, &mut facts)?;
    }
    if pytest::gate(info, content) {
        pytest::extract(info, content, tree, &mut facts)?;
    }
    if validators::gate(info, content) {
        validators::extract(info, content, tree, &mut facts)?;
    }
    if forms::gate(info, content) {
        forms::extract(info, content, tree, &mut facts)?;
    }
    if di::gate(info, content) {
        di::extract(info, content, tree, &scopes, &mut facts)?;
    }

    Ok(facts)
}
