//! Core language facts: symbols, references, property accessors.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, PropertyAccessorRow, RefRow, SymbolRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

/// One enclosing container on the walk stack.
#[derive(Debug, Clone)]
struct Container {
    name: String,
    is_class: bool,
}

pub fn extract(
    _info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
    _scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), content, &mut Vec::new(), facts)
}

fn walk(
    node: Node<'_>,
    src: &[u8],
    ancestry: &mut Vec<Container>,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let line = node.start_position().row as u32 + 1;

    match node.kind() {
        "function_definition" => {
            let name = field_text(node, "name", src);
            let in_class = ancestry.last().map(|c| c.is_class).unwrap_or(false);
            let qualified = qualify(ancestry, &name);
            let enclosing = ancestry
                .iter()
                .rev()
                .find(|c| !c.is_class)
                .map(|c| qualified_up_to(ancestry, &c.name))
                .unwrap_or_else(|| "global".to_string());
            let params = parameter_names(node, src);
            facts.push(FactRow::Symbol(SymbolRow {
                file: String::new(),
                line,
                end_line: node.end_position().row as u32 + 1,
                kind: if in_class { "method" } else { "function" }.to_string(),
                name: name.clone(),
                qualified_name: qualified,
                scope: enclosing,
                params: serde_json::to_string(&params).unwrap_or_else(|_| "[]".into()),
                symbol_id: 0,
            }))?;

            if in_class {
                if let Some(kind) = accessor_kind(node, src) {
                    facts.push(FactRow::PropertyAccessor(PropertyAccessorRow {
                        file: String::new(),
                        line,
                        class_name: ancestry
                            .last()
                            .map(|c| c.name.clone())
                            .unwrap_or_default(),
                        name: name.clone(),
                        kind: kind.to_string(),
                    }))?;
                }
            }

            ancestry.push(Container { name, is_class: false });
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, src, ancestry, facts)?;
            }
            ancestry.pop();
            return Ok(());
        }
        "class_definition" => {
            let name = field_text(node, "name", src);
            facts.push(FactRow::Symbol(SymbolRow {
                file: String::new(),
                line,
                end_line: node.end_position().row as u32 + 1,
                kind: "class".to_string(),
                name: name.clone(),
                qualified_name: qualify(ancestry, &name),
                scope: "global".to_string(),
                params: "[]".to_string(),
                symbol_id: 0,
            }))?;

            ancestry.push(Container { name, is_class: true });
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, src, ancestry, facts)?;
            }
            ancestry.pop();
            return Ok(());
        }
        "import_statement" => {
            for name in imported_names(node, src) {
                facts.push(FactRow::Ref(RefRow {
                    file: String::new(),
                    line,
                    name,
                    kind: "import".to_string(),
                    resolution: "unresolved".to_string(),
                    target_symbol_id: 0,
                }))?;
            }
        }
        "import_from_statement" => {
            for name in imported_names(node, src) {
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
        "call" => {
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
        "assignment" | "augmented_assignment" => {
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
            if let Some(right) = node.child_by_field_name("right") {
                for name in identifiers_in(right, src) {
                    facts.push(FactRow::Ref(RefRow {
                        file: String::new(),
                        line,
                        name,
                        kind: "read".to_string(),
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
        walk(child, src, ancestry, facts)?;
    }
    Ok(())
}

fn qualify(ancestry: &[Container], name: &str) -> String {
    if ancestry.is_empty() {
        name.to_string()
    } else {
        let prefix: Vec<&str> = ancestry.iter().map(|c| c.name.as_str()).collect();
        format!("{}.{}", prefix.join("."), name)
    }
}

/// Qualified name of the ancestry prefix ending at `name`.
fn qualified_up_to(ancestry: &[Container], name: &str) -> String {
    let mut parts = Vec::new();
    for c in ancestry {
        parts.push(c.name.as_str());
        if c.name == name {
            break;
        }
    }
    parts.join(".")
}

/// `@property` / `@x.setter` / `@x.deleter` on a method.
fn accessor_kind(func: Node<'_>, src: &[u8]) -> Option<&'static str> {
    let parent = func.parent()?;
    if parent.kind() != "decorated_definition" {
        return None;
    }
    let mut cursor = parent.walk();
    for child in parent.children(&mut cursor) {
        if child.kind() != "decorator" {
            continue;
        }
        let deco = text(child, src);
        if deco.trim_start_matches('@') == "property" {
            return Some("getter");
        }
        if deco.ends_with(".setter") {
            return Some("setter");
        }
        if deco.ends_with(".deleter") {
            return Some("deleter");
        }
    }
    None
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
                if let Some(ident) = first_identifier(child) {
                    names.push(text(ident, src));
                }
            }
            "list_splat_pattern" | "dictionary_splat_pattern" => {
                if let Some(ident) = first_identifier(child) {
                    names.push(text(ident, src));
                }
            }
            _ => {}
        }
    }
    names
}

fn first_identifier(node: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = node.walk();
    let found = node
        .children(&mut cursor)
        .find(|c| c.kind() == "identifier");
    found
}

fn imported_names(node: Node<'_>, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" | "relative_import" => names.push(text(child, src)),
            "aliased_import" => {
                if let Some(alias) = child.child_by_field_name("alias") {
                    names.push(text(alias, src));
                } else if let Some(name) = child.child_by_field_name("name") {
                    names.push(text(name, src));
                }
            }
            "wildcard_import" => names.push("*".to_string()),
            _ => {}
        }
    }
    names
}

fn callee_base_name(call: Node<'_>, src: &[u8]) -> Option<String> {
    let func = call.child_by_field_name("function")?;
    match func.kind() {
        "identifier" => Some(text(func, src)),
        "attribute" => func
            .child_by_field_name("attribute")
            .map(|attr| text(attr, src)),
        _ => None,
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
    // For attribute chains, the base identifier carries the data flow.
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

fn field_text(node: Node<'_>, field: &str, src: &[u8]) -> String {
    node.child_by_field_name(field)
        .map(|n| text(n, src))
        .unwrap_or_default()
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
