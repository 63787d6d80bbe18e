//! Validator-schema extraction (pydantic models).
//!
//! Gated on a `pydantic` import or the project tag.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, ValidationSchemaRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const FRAMEWORK: &str = "pydantic";

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag(FRAMEWORK) || contains(content, b"pydantic")
}

pub fn extract(
    _info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), content, facts)
}

fn walk(node: Node<'_>, src: &[u8], facts: &mut FileFacts) -> Result<(), ContractViolation> {
    if node.kind() == "class_definition" {
        let bases = node
            .child_by_field_name("superclasses")
            .map(|n| text(n, src))
            .unwrap_or_default();
        if bases.contains("BaseModel") {
            let line = node.start_position().row as u32 + 1;
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default();
            facts.push(FactRow::ValidationSchema(ValidationSchemaRow {
                file: String::new(),
                line,
                name,
                framework: FRAMEWORK.to_string(),
                field_count: annotated_field_count(node),
            }))?;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

/// Count class-level annotated fields (`name: Type` / `name: Type = ...`).
fn annotated_field_count(class: Node<'_>) -> u32 {
    let Some(body) = class.child_by_field_name("body") else { return 0 };
    let mut count = 0;
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let mut c2 = stmt.walk();
        for child in stmt.children(&mut c2) {
            if child.kind() == "assignment" && child.child_by_field_name("type").is_some() {
                count += 1;
            }
        }
    }
    count
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
