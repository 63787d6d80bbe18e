//! Data-flow facts: calls, call arguments, assignments, returns,
//! generator yields.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{
    AssignmentRow, CallArgRow, CallRow, FactRow, GeneratorYieldRow, ReturnRow,
};
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
    let in_function = scopes.function_at(line).to_string();

    match node.kind() {
        "assignment" | "augmented_assignment" => {
            let target = node
                .child_by_field_name("left")
                .map(|n| text(n, src))
                .unwrap_or_default();
            let right = node.child_by_field_name("right");
            let expression = right.map(|n| text(n, src)).unwrap_or_default();
            let read_vars = right
                .map(|n| identifiers_in(n, src))
                .unwrap_or_default();
            if !target.is_empty() {
                facts.push(FactRow::Assignment(AssignmentRow {
                    file: String::new(),
                    line,
                    in_function,
                    target,
                    expression,
                    read_vars: to_json(&read_vars),
                }))?;
            }
        }
        "call" => {
            let (callee_name, receiver, unresolved, dynamic) = callee_of(node, src);
            let args = node.child_by_field_name("arguments");
            let argument_count = args
                .map(|a| {
                    let mut cursor = a.walk();
                    a.children(&mut cursor)
                        .filter(|c| c.is_named() && c.kind() != "comment")
                        .count() as u32
                })
                .unwrap_or(0);

            facts.push(FactRow::Call(CallRow {
                file: String::new(),
                line,
                caller_function: in_function,
                callee_name: callee_name.clone(),
                receiver,
                argument_count,
                callee_unresolved: unresolved,
                requires_runtime_analysis: dynamic,
            }))?;

            if let Some(args) = args {
                let mut index = 0u32;
                let mut cursor = args.walk();
                for child in args.children(&mut cursor) {
                    if !child.is_named() || child.kind() == "comment" {
                        continue;
                    }
                    let (keyword, value) = if child.kind() == "keyword_argument" {
                        (
                            child
                                .child_by_field_name("name")
                                .map(|n| text(n, src))
                                .unwrap_or_default(),
                            child.child_by_field_name("value").unwrap_or(child),
                        )
                    } else {
                        (String::new(), child)
                    };
                    let read_vars = identifiers_in(value, src);
                    facts.push(FactRow::CallArg(CallArgRow {
                        file: String::new(),
                        line,
                        callee_name: callee_name.clone(),
                        arg_index: index,
                        keyword,
                        expression: text(value, src),
                        read_vars: to_json(&read_vars),
                    }))?;
                    index += 1;
                }
            }
        }
        "return_statement" => {
            let mut read_vars = Vec::new();
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                if child.is_named() {
                    read_vars.extend(identifiers_in(child, src));
                }
            }
            read_vars.sort();
            read_vars.dedup();
            facts.push(FactRow::Return(ReturnRow {
                file: String::new(),
                line,
                in_function,
                read_vars: to_json(&read_vars),
            }))?;
        }
        "yield" => {
            let is_delegated = {
                let mut cursor = node.walk();
                let found = node.children(&mut cursor).any(|c| c.kind() == "from");
                found
            };
            let expression = {
                let mut cursor = node.walk();
                node.children(&mut cursor)
                    .filter(|c| c.is_named())
                    .map(|c| text(c, src))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            facts.push(FactRow::GeneratorYield(GeneratorYieldRow {
                file: String::new(),
                line,
                in_function,
                expression,
                is_delegated,
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

/// `(callee_name, receiver, callee_unresolved, requires_runtime_analysis)`.
fn callee_of(call: Node<'_>, src: &[u8]) -> (String, String, bool, bool) {
    let Some(func) = call.child_by_field_name("function") else {
        return (text(call, src), String::new(), true, true);
    };
    match func.kind() {
        "identifier" => (text(func, src), String::new(), false, false),
        "attribute" => {
            let name = func
                .child_by_field_name("attribute")
                .map(|n| text(n, src))
                .unwrap_or_default();
            let receiver = func
                .child_by_field_name("object")
                .map(|n| text(n, src))
                .unwrap_or_default();
            (name, receiver, false, false)
        }
        // getattr(x, name)() and friends: the callee cannot be named
        // statically — record the hop, do not propagate through it.
        "call" | "subscript" => (text(func, src), String::new(), true, true),
        _ => (text(func, src), String::new(), true, false),
    }
}

fn identifiers_in(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    collect_identifiers(node, src, &mut out);
    out.sort();
    out.dedup();
    out
}

fn collect_identifiers(node: Node<'_>, src: &[u8], out: &mut Vec<String>) {
    if node.kind() == "identifier" {
        out.push(text(node, src));
        return;
    }
    if node.kind() == "attribute" {
        if let Some(object) = node.child_by_field_name("object") {
            collect_identifiers(object, src, out);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_identifiers(child, src, out);
    }
}

fn to_json(vars: &[String]) -> String {
    serde_json::to_string(vars).unwrap_or_else(|_| "[]".into())
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
