//! Dependency-injection extraction (FastAPI `Depends`).
//!
//! Gated on a `fastapi` import.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{DiInjectionRow, FactRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const FRAMEWORK: &str = "fastapi";

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag(FRAMEWORK) || contains(content, b"fastapi")
}

pub fn extract(
    _info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
    scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), content, scopes, facts)
}

fn walk(
    node: Node<'_>,
    src: &[u8],
    scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    if node.kind() == "call" {
        let callee = node
            .child_by_field_name("function")
            .map(|n| text(n, src))
            .unwrap_or_default();
        if callee == "Depends" {
            let line = node.start_position().row as u32 + 1;
            let dependency = first_positional_text(node, src).unwrap_or_default();
            facts.push(FactRow::DiInjection(DiInjectionRow {
                file: String::new(),
                line,
                target: scopes.function_at(line).to_string(),
                dependency,
                framework: FRAMEWORK.to_string(),
            }))?;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, scopes, facts)?;
    }
    Ok(())
}

fn first_positional_text(call: Node<'_>, src: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let result = args
        .children(&mut cursor)
        .find(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")
        .map(|c| text(c, src));
    result
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
