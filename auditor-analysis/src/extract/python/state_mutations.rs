//! Instance-state mutation sites.
//!
//! Emits a row for every assignment to `self.*`, augmented assignment to
//! `self.*`, and mutating method call on a parameter. Context flags tell
//! hypothesis generators whether the mutation is expected construction
//! (`__init__`), a property setter, or another dunder — at most one flag
//! is set, and regular methods carry none.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, StateMutationRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

/// Method names on collections that mutate the receiver.
const MUTATING_METHODS: &[&str] = &[
    "append", "extend", "insert", "remove", "pop", "clear", "add",
    "update", "setdefault", "sort", "reverse",
];

#[derive(Debug, Clone, Copy, Default)]
struct MethodContext {
    is_init: bool,
    is_property_setter: bool,
    is_dunder_method: bool,
}

pub fn extract(
    _info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
    scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), content, scopes, MethodContext::default(), &Vec::new(), facts)
}

fn walk(
    node: Node<'_>,
    src: &[u8],
    scopes: &ScopeMap,
    ctx: MethodContext,
    params: &Vec<String>,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let line = node.start_position().row as u32 + 1;

    match node.kind() {
        "function_definition" => {
            let name = node
                .child_by_field_name("name")
                .map(|n| text(n, src))
                .unwrap_or_default();
            let ctx = method_context(node, &name, src);
            let params = parameter_names(node, src);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, src, scopes, ctx, &params, facts)?;
            }
            return Ok(());
        }
        "assignment" | "augmented_assignment" => {
            let operation = if node.kind() == "assignment" {
                "assignment"
            } else {
                "augmented_assignment"
            };
            if let Some(left) = node.child_by_field_name("left") {
                let target = text(left, src);
                if target.starts_with("self.") {
                    facts.push(FactRow::StateMutation(StateMutationRow {
                        file: String::new(),
                        line,
                        in_function: scopes.function_at(line).to_string(),
                        target,
                        operation: operation.to_string(),
                        is_init: ctx.is_init,
                        is_property_setter: ctx.is_property_setter,
                        is_dunder_method: ctx.is_dunder_method,
                    }))?;
                }
            }
        }
        "call" => {
            // p.append(x) where p is a parameter of the enclosing function.
            if let Some(func) = node.child_by_field_name("function") {
                if func.kind() == "attribute" {
                    let method = func
                        .child_by_field_name("attribute")
                        .map(|n| text(n, src))
                        .unwrap_or_default();
                    let receiver = func
                        .child_by_field_name("object")
                        .map(|n| text(n, src))
                        .unwrap_or_default();
                    let mutates_param = MUTATING_METHODS.contains(&method.as_str())
                        && params.iter().any(|p| *p == receiver);
                    if mutates_param {
                        facts.push(FactRow::StateMutation(StateMutationRow {
                            file: String::new(),
                            line,
                            in_function: scopes.function_at(line).to_string(),
                            target: receiver,
                            operation: "method_call".to_string(),
                            is_init: ctx.is_init,
                            is_property_setter: ctx.is_property_setter,
                            is_dunder_method: ctx.is_dunder_method,
                        }))?;
                    }
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, scopes, ctx, params, facts)?;
    }
    Ok(())
}

/// Classify the enclosing method. `__init__` wins over the generic
/// dunder flag; a property setter is never also counted as a dunder.
fn method_context(func: Node<'_>, name: &str, src: &[u8]) -> MethodContext {
    if name == "__init__" {
        return MethodContext { is_init: true, ..Default::default() };
    }
    if is_property_setter(func, src) {
        return MethodContext {
            is_property_setter: true,
            ..Default::default()
        };
    }
    if name.starts_with("__") && name.ends_with("__") && name.len() > 4 {
        return MethodContext {
            is_dunder_method: true,
            ..Default::default()
        };
    }
    MethodContext::default()
}

fn is_property_setter(func: Node<'_>, src: &[u8]) -> bool {
    let Some(parent) = func.parent() else { return false };
    if parent.kind() != "decorated_definition" {
        return false;
    }
    let mut cursor = parent.walk();
    let result = parent.children(&mut cursor).any(|child| {
        child.kind() == "decorator" && text(child, src).ends_with(".setter")
    });
    result
}

fn parameter_names(func: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let Some(params) = func.child_by_field_name("parameters") else {
        return names;
    };
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(text(child, src)),
            "typed_parameter" | "default_parameter" | "typed_default_parameter" => {
                let mut c2 = child.walk();
                let ident = child.children(&mut c2).find(|c| c.kind() == "identifier");
                if let Some(ident) = ident {
                    names.push(text(ident, src));
                }
            }
            _ => {}
        }
    }
    names.retain(|n| n != "self" && n != "cls");
    names
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
