//! Express-style route extraction: `app.get("/path", handler)` and
//! router variants.
//!
//! Gated on an `express` import or the project tag.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{EndpointRow, FactRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const HTTP_METHODS: &[&str] = &["get", "post", "put", "delete", "patch", "head", "options", "all"];

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag("express") || contains(content, b"express")
}

pub fn extract(
    _info: &FileInfo,
    content: &[u8],
    tree: &ParsedTree,
    _scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), content, facts)
}

fn walk(node: Node<'_>, src: &[u8], facts: &mut FileFacts) -> Result<(), ContractViolation> {
    if node.kind() == "call_expression" {
        if let Some(row) = route_of(node, src) {
            facts.push(FactRow::Endpoint(row))?;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

fn route_of(call: Node<'_>, src: &[u8]) -> Option<EndpointRow> {
    let func = call.child_by_field_name("function")?;
    if func.kind() != "member_expression" {
        return None;
    }
    let method = func.child_by_field_name("property")?.utf8_text(src).ok()?;
    if !HTTP_METHODS.contains(&method) {
        return None;
    }
    let receiver = func.child_by_field_name("object")?.utf8_text(src).ok()?;
    if !matches!(receiver, "app" | "router" | "server") {
        return None;
    }

    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let named: Vec<Node<'_>> = args.children(&mut cursor).filter(|c| c.is_named()).collect();
    let pattern = string_literal_value(*named.first()?, src)?;
    let handler = named
        .last()
        .map(|n| handler_name(*n, src))
        .unwrap_or_default();

    Some(EndpointRow {
        file: String::new(),
        line: call.start_position().row as u32 + 1,
        method: method.to_uppercase(),
        pattern,
        handler,
        endpoint_kind: "http".to_string(),
        has_group_segments: false,
        has_optional_params: false,
        has_rest_params: false,
    })
}

fn handler_name(node: Node<'_>, src: &[u8]) -> String {
    match node.kind() {
        "identifier" => node.utf8_text(src).unwrap_or_default().to_string(),
        "member_expression" => node.utf8_text(src).unwrap_or_default().to_string(),
        // Inline closures have no name; report the shape.
        "arrow_function" | "function_expression" => "<inline>".to_string(),
        _ => String::new(),
    }
}

fn string_literal_value(node: Node<'_>, src: &[u8]) -> Option<String> {
    if !matches!(node.kind(), "string" | "template_string") {
        return None;
    }
    let mut cursor = node.walk();
    if node
        .children(&mut cursor)
        .any(|c| c.kind() == "template_substitution")
    {
        return None;
    }
    let raw = node.utf8_text(src).ok()?;
    Some(raw.trim_matches(['"', '\'', '`']).to_string())
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
