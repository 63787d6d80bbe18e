//! SvelteKit file-system route extraction.
//!
//! Routes are derived from the path shape under `src/routes/`:
//!
//! - `+page.svelte`          → a page endpoint (GET)
//! - `+server.{js,ts}`       → HTTP endpoints, one per exported verb
//! - `+page.server.{js,ts}`  → form actions (POST), `endpoint_kind`
//!   `form_action` so generic HTTP matching skips them
//!
//! Route-id grammar handled: literal segments, `[param]`,
//! `[param=matcher]`, `[[optional]]`, `[[optional=matcher]]`,
//! `[...rest]`, and `(group)` segments which vanish from the pattern.
//! `src/routes/(auth)/[[id=uuid]]/[...rest]` normalizes to
//! `/:id?/:rest*`.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{EndpointParamRow, EndpointRow, FactRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::parsers::ParsedTree;

use super::FileInfo;

pub const KIND_HTTP: &str = "http";
pub const KIND_PAGE: &str = "page";
pub const KIND_FORM_ACTION: &str = "form_action";

const ROUTE_FILES: &[&str] = &[
    "+page.svelte",
    "+page.server.js",
    "+page.server.ts",
    "+server.js",
    "+server.ts",
];

const HTTP_VERBS: &[&str] = &["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "HEAD"];

pub fn gate(info: &FileInfo) -> bool {
    let path = &info.relative_path;
    if !path.contains("src/routes/") && !path.starts_with("src/routes") {
        return false;
    }
    let name = path.rsplit('/').next().unwrap_or(path);
    ROUTE_FILES.contains(&name)
}

pub fn extract(
    info: &FileInfo,
    content: &[u8],
    tree: Option<&ParsedTree>,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let Some((route_id, file_name)) = split_route(&info.relative_path) else {
        return Ok(());
    };
    let route = normalize_route_id(&route_id);

    match file_name {
        "+page.svelte" => {
            emit_endpoint(facts, &route, "GET", KIND_PAGE, "", 1)?;
            emit_params(facts, &route, 1)?;
        }
        "+server.js" | "+server.ts" => {
            if let Some(tree) = tree {
                for (verb, line) in exported_verbs(tree.root(), content) {
                    emit_endpoint(facts, &route, &verb, KIND_HTTP, &verb, line)?;
                }
                emit_params(facts, &route, 1)?;
            }
        }
        "+page.server.js" | "+page.server.ts" => {
            if let Some(tree) = tree {
                for (action, line) in exported_actions(tree.root(), content) {
                    let pattern = if action == "default" {
                        route.pattern.clone()
                    } else {
                        format!("{}?/{}", route.pattern, action)
                    };
                    facts.push(FactRow::Endpoint(EndpointRow {
                        file: String::new(),
                        line,
                        method: "POST".to_string(),
                        pattern,
                        handler: action,
                        endpoint_kind: KIND_FORM_ACTION.to_string(),
                        has_group_segments: route.has_group_segments,
                        has_optional_params: route.has_optional_params,
                        has_rest_params: route.has_rest_params,
                    }))?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// `(route_id, file_name)` from a project-relative path, or None when
/// the path is not under `src/routes/`.
fn split_route(path: &str) -> Option<(String, &str)> {
    let idx = path.find("src/routes")?;
    let rest = &path[idx + "src/routes".len()..];
    let rest = rest.strip_prefix('/').unwrap_or(rest);
    match rest.rsplit_once('/') {
        Some((dir, file)) => Some((dir.to_string(), file)),
        None => Some((String::new(), rest)),
    }
}

/// One route parameter parsed from the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteParam {
    pub name: String,
    pub segment: u32,
    pub is_optional: bool,
    pub is_rest: bool,
    pub matcher: String,
}

/// A normalized route.
#[derive(Debug, Clone)]
pub struct NormalizedRoute {
    pub pattern: String,
    pub params: Vec<RouteParam>,
    pub has_group_segments: bool,
    pub has_optional_params: bool,
    pub has_rest_params: bool,
}

/// Normalize a SvelteKit route id into an express-style pattern.
pub fn normalize_route_id(route_id: &str) -> NormalizedRoute {
    let mut pattern_segments: Vec<String> = Vec::new();
    let mut params = Vec::new();
    let mut has_group_segments = false;
    let mut has_optional_params = false;
    let mut has_rest_params = false;

    for raw in route_id.split('/').filter(|s| !s.is_empty()) {
        // (group) segments organize the tree without affecting the URL.
        if raw.starts_with('(') && raw.ends_with(')') {
            has_group_segments = true;
            continue;
        }
        let segment_index = pattern_segments.len() as u32;

        if let Some(inner) = raw.strip_prefix("[[").and_then(|s| s.strip_suffix("]]")) {
            let (name, matcher) = split_matcher(inner);
            pattern_segments.push(format!(":{}?", name));
            has_optional_params = true;
            params.push(RouteParam {
                name: name.to_string(),
                segment: segment_index,
                is_optional: true,
                is_rest: false,
                matcher: matcher.to_string(),
            });
        } else if let Some(inner) = raw
            .strip_prefix("[...")
            .and_then(|s| s.strip_suffix(']'))
        {
            pattern_segments.push(format!(":{}*", inner));
            has_rest_params = true;
            params.push(RouteParam {
                name: inner.to_string(),
                segment: segment_index,
                is_optional: false,
                is_rest: true,
                matcher: String::new(),
            });
        } else if let Some(inner) = raw.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let (name, matcher) = split_matcher(inner);
            pattern_segments.push(format!(":{}", name));
            params.push(RouteParam {
                name: name.to_string(),
                segment: segment_index,
                is_optional: false,
                is_rest: false,
                matcher: matcher.to_string(),
            });
        } else {
            pattern_segments.push(raw.to_string());
        }
    }

    let pattern = if pattern_segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", pattern_segments.join("/"))
    };

    NormalizedRoute {
        pattern,
        params,
        has_group_segments,
        has_optional_params,
        has_rest_params,
    }
}

fn split_matcher(inner: &str) -> (&str, &str) {
    match inner.split_once('=') {
        Some((name, matcher)) => (name, matcher),
        None => (inner, ""),
    }
}

fn emit_endpoint(
    facts: &mut FileFacts,
    route: &NormalizedRoute,
    method: &str,
    kind: &str,
    handler: &str,
    line: u32,
) -> Result<(), ContractViolation> {
    facts.push(FactRow::Endpoint(EndpointRow {
        file: String::new(),
        line,
        method: method.to_string(),
        pattern: route.pattern.clone(),
        handler: handler.to_string(),
        endpoint_kind: kind.to_string(),
        has_group_segments: route.has_group_segments,
        has_optional_params: route.has_optional_params,
        has_rest_params: route.has_rest_params,
    }))
}

fn emit_params(
    facts: &mut FileFacts,
    route: &NormalizedRoute,
    line: u32,
) -> Result<(), ContractViolation> {
    for param in &route.params {
        facts.push(FactRow::EndpointParam(EndpointParamRow {
            file: String::new(),
            line,
            pattern: route.pattern.clone(),
            name: param.name.clone(),
            segment: param.segment,
            is_optional: param.is_optional,
            is_rest: param.is_rest,
            matcher: param.matcher.clone(),
        }))?;
    }
    Ok(())
}

/// Exported HTTP verb handlers in a `+server` module:
/// `export function GET(...)` / `export const POST = ...`.
fn exported_verbs(root: Node<'_>, src: &[u8]) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "export_statement" {
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                match child.kind() {
                    "function_declaration" => {
                        if let Some(name) = child.child_by_field_name("name") {
                            let name = text(name, src);
                            if HTTP_VERBS.contains(&name.as_str()) {
                                out.push((name, child.start_position().row as u32 + 1));
                            }
                        }
                    }
                    "lexical_declaration" => {
                        let mut c2 = child.walk();
                        for decl in child.children(&mut c2) {
                            if decl.kind() != "variable_declarator" {
                                continue;
                            }
                            if let Some(name) = decl.child_by_field_name("name") {
                                let name = text(name, src);
                                if HTTP_VERBS.contains(&name.as_str()) {
                                    out.push((name, decl.start_position().row as u32 + 1));
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
            continue;
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out.sort();
    out
}

/// Keys of the exported `actions` object in a `+page.server` module.
fn exported_actions(root: Node<'_>, src: &[u8]) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.kind() == "variable_declarator" {
            let is_actions = node
                .child_by_field_name("name")
                .map(|n| text(n, src) == "actions")
                .unwrap_or(false);
            if is_actions {
                if let Some(value) = node.child_by_field_name("value") {
                    collect_object_keys(value, src, &mut out);
                }
            }
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    out.sort();
    out
}

fn collect_object_keys(node: Node<'_>, src: &[u8], out: &mut Vec<(String, u32)>) {
    // `satisfies Actions` / `as Actions` wrap the object literal.
    let object = if node.kind() == "object" {
        node
    } else {
        let mut cursor = node.walk();
        let found = node.children(&mut cursor).find(|c| c.kind() == "object");
        match found {
            Some(o) => o,
            None => return,
        }
    };

    let mut cursor = object.walk();
    for pair in object.children(&mut cursor) {
        if !matches!(pair.kind(), "pair" | "method_definition") {
            continue;
        }
        let Some(key) = pair.child_by_field_name("key").or_else(|| pair.child_by_field_name("name"))
        else {
            continue;
        };
        let name = text(key, src).trim_matches(['"', '\'']).to_string();
        if !name.is_empty() {
            out.push((name, pair.start_position().row as u32 + 1));
        }
    }
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_optional_and_rest_segments_normalize() {
        let route = normalize_route_id("(auth)/[[id=uuid]]/[...rest]");
        assert_eq!(route.pattern, "/:id?/:rest*");
        assert!(route.has_group_segments);
        assert!(route.has_optional_params);
        assert!(route.has_rest_params);
        assert_eq!(route.params.len(), 2);

        let id = &route.params[0];
        assert_eq!(id.name, "id");
        assert_eq!(id.segment, 0);
        assert!(id.is_optional);
        assert_eq!(id.matcher, "uuid");

        let rest = &route.params[1];
        assert_eq!(rest.name, "rest");
        assert_eq!(rest.segment, 1);
        assert!(rest.is_rest);
    }

    #[test]
    fn plain_and_matcher_params() {
        let route = normalize_route_id("blog/[slug]");
        assert_eq!(route.pattern, "/blog/:slug");
        assert_eq!(route.params[0].segment, 1);

        let route = normalize_route_id("user/[id=integer]");
        assert_eq!(route.pattern, "/user/:id");
        assert_eq!(route.params[0].matcher, "integer");
    }

    #[test]
    fn root_route_is_slash() {
        let route = normalize_route_id("");
        assert_eq!(route.pattern, "/");
        assert!(route.params.is_empty());
    }
}
