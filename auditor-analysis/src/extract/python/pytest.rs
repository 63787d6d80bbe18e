//! pytest extraction: fixtures, parametrizations, markers.
//!
//! Gated on a `pytest` import or the conventional test-file shape.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, FixtureRow, MarkerRow, ParametrizationRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    if contains(content, b"pytest") {
        return true;
    }
    let name = info
        .relative_path
        .rsplit('/')
        .next()
        .unwrap_or(&info.relative_path);
    name.starts_with("test_") || name == "conftest.py"
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
    if node.kind() == "decorated_definition" {
        extract_decorated(node, src, facts)?;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

fn extract_decorated(
    decorated: Node<'_>,
    src: &[u8],
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let Some(func) = decorated.child_by_field_name("definition") else {
        return Ok(());
    };
    if func.kind() != "function_definition" {
        return Ok(());
    }
    let func_name = func
        .child_by_field_name("name")
        .map(|n| text(n, src))
        .unwrap_or_default();
    let line = func.start_position().row as u32 + 1;

    let mut cursor = decorated.walk();
    for deco in decorated.children(&mut cursor) {
        if deco.kind() != "decorator" {
            continue;
        }
        let deco_text = text(deco, src);

        if deco_text.contains("pytest.fixture") || deco_text.contains("@fixture") {
            let (scope, autouse) = decorator_call(deco)
                .map(|call| {
                    (
                        kwarg_string(call, src, "scope")
                            .unwrap_or_else(|| "function".to_string()),
                        kwarg_value_text(call, src, "autouse")
                            .map(|v| v == "True")
                            .unwrap_or(false),
                    )
                })
                .unwrap_or(("function".to_string(), false));
            facts.push(FactRow::Fixture(FixtureRow {
                file: String::new(),
                line,
                name: func_name.clone(),
                scope,
                autouse,
            }))?;
        } else if deco_text.contains("pytest.mark.parametrize") {
            if let Some(call) = decorator_call(deco) {
                let param_names = first_positional_string(call, src).unwrap_or_default();
                let case_count = second_positional_list_len(call).unwrap_or(0);
                facts.push(FactRow::Parametrization(ParametrizationRow {
                    file: String::new(),
                    line,
                    test_name: func_name.clone(),
                    param_names,
                    case_count,
                }))?;
            }
        } else if let Some(marker) = deco_text.strip_prefix("@pytest.mark.") {
            let marker = marker.split('(').next().unwrap_or(marker).to_string();
            facts.push(FactRow::Marker(MarkerRow {
                file: String::new(),
                line,
                test_name: func_name.clone(),
                marker,
            }))?;
        }
    }
    Ok(())
}

fn decorator_call(deco: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = deco.walk();
    let found = deco.children(&mut cursor).find(|c| c.kind() == "call");
    found
}

fn first_positional_string(call: Node<'_>, src: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args
        .children(&mut cursor)
        .find(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")?;
    string_literal_value(first, src)
}

/// Element count of the second positional argument when it is a list.
fn second_positional_list_len(call: Node<'_>) -> Option<u32> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let second = args
        .children(&mut cursor)
        .filter(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")
        .nth(1)?;
    if second.kind() != "list" {
        return None;
    }
    let mut c2 = second.walk();
    Some(second.children(&mut c2).filter(|c| c.is_named()).count() as u32)
}

fn kwarg_string(call: Node<'_>, src: &[u8], name: &str) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() != "keyword_argument" {
            continue;
        }
        let kw = child.child_by_field_name("name")?.utf8_text(src).ok()?;
        if kw == name {
            return string_literal_value(child.child_by_field_name("value")?, src);
        }
    }
    None
}

fn kwarg_value_text(call: Node<'_>, src: &[u8], name: &str) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() != "keyword_argument" {
            continue;
        }
        let kw = child.child_by_field_name("name")?.utf8_text(src).ok()?;
        if kw == name {
            return child.child_by_field_name("value").map(|v| text(v, src));
        }
    }
    None
}

fn string_literal_value(node: Node<'_>, src: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    let mut cursor = node.walk();
    if node.children(&mut cursor).any(|c| c.kind() == "interpolation") {
        return None;
    }
    let raw = node.utf8_text(src).ok()?;
    Some(
        raw.trim_start_matches(['r', 'b', 'f', 'u'])
            .trim_matches(['"', '\''])
            .to_string(),
    )
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
