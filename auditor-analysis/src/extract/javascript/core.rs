//! Core language facts for JS/TS: symbols and references.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, RefRow, SymbolRow};
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
    walk(tree.root(), content, scopes, &mut Vec::new(), facts)
}

fn walk(
    node: Node<'_>,
    src: &[u8],
    scopes: &ScopeMap,
    class_stack: &mut Vec<String>,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let line = node.start_position().row as u32 + 1;

    match node.kind() {
        "function_declaration" | "generator_function_declaration" => {
            let name = field_text(node, "name", src);
            push_symbol(node, &name, &name, "function", src, facts)?;
        }
        "method_definition" => {
            let name = field_text(node, "name", src);
            let qualified = match class_stack.last() {
                Some(class) => format!("{}.{}", class, name),
                None => name.clone(),
            };
            push_symbol(node, &name, &qualified, "method", src, facts)?;
        }
        "class_declaration" => {
            let name = field_text(node, "name", src);
            push_symbol(node, &name, &name, "class", src, facts)?;
            class_stack.push(name);
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, src, scopes, class_stack, facts)?;
            }
            class_stack.pop();
            return Ok(());
        }
        "variable_declarator" => {
            // const f = () => {} / const f = function () {}
            let value = node.child_by_field_name("value");
            if value
                .map(|v| matches!(v.kind(), "arrow_function" | "function_expression"))
                .unwrap_or(false)
            {
                let name = field_text(node, "name", src);
                push_symbol(node, &name, &name, "function", src, facts)?;
            }
        }
        "import_statement" => {
            if let Some(source) = node.child_by_field_name("source") {
                facts.push(FactRow::Ref(RefRow {
                    file: String::new(),
                    line,
                    name: strip_quotes(&text(source, src)),
                    kind: "import".to_string(),
                    resolution: "unresolved".to_string(),
                    target_symbol_id: 0,
                }))?;
            }
            // Named imports are `from`-style references.
            for name in named_imports(node, src) {
                facts.push(FactRow::Ref(RefRow {
                    file: String::new(),
                    line,
                    name,
                    kind: "from".to_string(),
                    resolution: "unresolved".to_string(),
                    target_symbol_id: 0,
                }))?;
            }
        }
        "call_expression" => {
            if let Some(name) = callee_base_name(node, src) {
                facts.push(FactRow::Ref(RefRow {
                    file: String::new(),
                    line,
                    name,
                    kind: "call".to_string(),
                    resolution: "unresolved".to_string(),
                    target_symbol_id: 0,
                }))?;
            }
        }
        "assignment_expression" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "identifier" {
                    facts.push(FactRow::Ref(RefRow {
                        file: String::new(),
                        line,
                        name: text(left, src),
                        kind: "write".to_string(),
                        resolution: "unresolved".to_string(),
                        target_symbol_id: 0,
                    }))?;
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, scopes, class_stack, facts)?;
    }
    Ok(())
}

fn push_symbol(
    node: Node<'_>,
    name: &str,
    qualified: &str,
    kind: &str,
    src: &[u8],
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    if name.is_empty() {
        return Ok(());
    }
    let line = node.start_position().row as u32 + 1;
    let params = parameter_names(node, src);
    facts.push(FactRow::Symbol(SymbolRow {
        file: String::new(),
        line,
        end_line: node.end_position().row as u32 + 1,
        kind: kind.to_string(),
        name: name.to_string(),
        qualified_name: qualified.to_string(),
        scope: "global".to_string(),
        params: serde_json::to_string(&params).unwrap_or_else(|_| "[]".into()),
        symbol_id: 0,
    }))
}

fn parameter_names(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let params = node
        .child_by_field_name("parameters")
        .or_else(|| {
            node.child_by_field_name("value")
                .and_then(|v| v.child_by_field_name("parameters"))
        });
    let Some(params) = params else { return Vec::new() };
    let mut names = Vec::new();
    let mut cursor = params.walk();
    for child in params.children(&mut cursor) {
        match child.kind() {
            "identifier" => names.push(text(child, src)),
            "required_parameter" | "optional_parameter" => {
                if let Some(pattern) = child.child_by_field_name("pattern") {
                    if pattern.kind() == "identifier" {
                        names.push(text(pattern, src));
                    }
                }
            }
            "rest_pattern" => {
                let mut c2 = child.walk();
                let ident = child.children(&mut c2).find(|c| c.kind() == "identifier");
                if let Some(ident) = ident {
                    names.push(text(ident, src));
                }
            }
            _ => {}
        }
    }
    names
}

fn named_imports(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut stack = vec![node];
    while let Some(n) = stack.pop() {
        if n.kind() == "import_specifier" {
            if let Some(name) = n.child_by_field_name("name") {
                out.push(text(name, src));
            }
            continue;
        }
        let mut cursor = n.walk();
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
    out.sort();
    out
}

fn callee_base_name(call: Node<'_>, src: &[u8]) -> Option<String> {
    let func = call.child_by_field_name("function")?;
    match func.kind() {
        "identifier" => Some(text(func, src)),
        "member_expression" => func
            .child_by_field_name("property")
            .map(|p| text(p, src)),
        _ => None,
    }
}

fn strip_quotes(s: &str) -> String {
    s.trim_matches(['"', '\'', '`']).to_string()
}

fn field_text(node: Node<'_>, field: &str, src: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|n| text(n, src))
        .unwrap_or_default()
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
