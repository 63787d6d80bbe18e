//! Form extraction (WTForms / Flask-WTF).
//!
//! Gated on a `wtforms` or `flask_wtf` import.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, FormRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const FRAMEWORK: &str = "wtforms";

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag(FRAMEWORK)
        || contains(content, b"wtforms")
        || contains(content, b"flask_wtf")
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
        if bases.contains("Form") {
            let line = node.start_position().row as u32 + 1;
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default();
            facts.push(FactRow::Form(FormRow {
                file: String::new(),
                line,
                name,
                framework: FRAMEWORK.to_string(),
                field_count: field_count(node, src),
            }))?;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

/// Count class-level `name = SomethingField(...)` assignments.
fn field_count(class: Node<'_>, src: &[u8]) -> u32 {
    let Some(body) = class.child_by_field_name("body") else { return 0 };
    let mut count = 0;
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        if stmt.kind() != "expression_statement" {
            continue;
        }
        let mut c2 = stmt.walk();
        for child in stmt.children(&mut c2) {
            if child.kind() != "assignment" {
                continue;
            }
            let rhs_is_field = child
                .child_by_field_name("right")
                .filter(|r| r.kind() == "call")
                .and_then(|r| r.child_by_field_name("function"))
                .map(|f| text(f, src).ends_with("Field"))
                .unwrap_or(false);
            if rhs_is_field {
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
