//! Exception raise/catch sites.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{ExceptionFlowRow, FactRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

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
    let line = node.start_position().row as u32 + 1;

    match node.kind() {
        "raise_statement" => {
            facts.push(FactRow::ExceptionFlow(ExceptionFlowRow {
                file: String::new(),
                line,
                in_function: scopes.function_at(line).to_string(),
                kind: "raise".to_string(),
                exception_type: raised_type(node, src),
            }))?;
        }
        "except_clause" => {
            facts.push(FactRow::ExceptionFlow(ExceptionFlowRow {
                file: String::new(),
                line,
                in_function: scopes.function_at(line).to_string(),
                kind: "catch".to_string(),
                exception_type: caught_type(node, src),
            }))?;
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, scopes, facts)?;
    }
    Ok(())
}

/// `raise ValueError(...)` → "ValueError"; bare `raise` → "".
fn raised_type(node: Node<'_>, src: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "call" => {
                if let Some(func) = child.child_by_field_name("function") {
                    return text(func, src);
                }
            }
            "identifier" | "attribute" => return text(child, src),
            _ => {}
        }
    }
    String::new()
}

/// `except (A, B) as e:` → "A, B"; bare `except:` → "".
fn caught_type(node: Node<'_>, src: &[u8]) -> String {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "identifier" | "attribute" => return text(child, src),
            "tuple" => {
                let mut c2 = child.walk();
                let names: Vec<String> = child
                    .children(&mut c2)
                    .filter(|c| matches!(c.kind(), "identifier" | "attribute"))
                    .map(|c| text(c, src))
                    .collect();
                return names.join(", ");
            }
            // `as e` binder and the block follow the type expression.
            "block" => break,
            _ => {}
        }
    }
    String::new()
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
