//! I/O operation sites: file, network, process, environment.
//!
//! `target` is recorded only when the argument is a literal; a computed
//! target sets `is_static=false` and `requires_runtime_analysis=true` so
//! downstream consumers treat the row as needing runtime confirmation.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, IoOperationRow};
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
    if node.kind() == "call" {
        if let Some(row) = classify_call(node, src, scopes) {
            facts.push(FactRow::IoOperation(row))?;
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, scopes, facts)?;
    }
    Ok(())
}

fn classify_call(call: Node<'_>, src: &[u8], scopes: &ScopeMap) -> Option<IoOperationRow> {
    let func = call.child_by_field_name("function")?;
    let full = text(func, src);
    let line = call.start_position().row as u32 + 1;

    let (kind, target_arg_index) = match full.as_str() {
        "open" => {
            // Mode decides read vs write; default is read.
            let mode = call_arg_literal(call, src, 1)
                .or_else(|| kwarg_literal(call, src, "mode"))
                .unwrap_or_else(|| "r".to_string());
            let kind = if mode.contains('w') || mode.contains('a') || mode.contains('+') {
                "file_write"
            } else {
                "file_read"
            };
            let (target, is_static) = target_of(call, src, 0);
            return Some(IoOperationRow {
                file: String::new(),
                line,
                in_function: scopes.function_at(line).to_string(),
                kind: kind.to_string(),
                requires_runtime_analysis: !is_static,
                target,
                is_static,
                mode,
            });
        }
        "os.getenv" | "os.environ.get" => ("env_read", 0),
        "subprocess.run" | "subprocess.Popen" | "subprocess.call"
        | "subprocess.check_output" | "os.system" | "os.popen" => ("process", 0),
        "requests.get" | "requests.post" | "requests.put" | "requests.delete"
        | "requests.request" | "urllib.request.urlopen" | "httpx.get" | "httpx.post" => {
            ("network", 0)
        }
        "shutil.copy" | "shutil.move" | "os.remove" | "os.unlink" | "pathlib.Path" => {
            ("file_write", 0)
        }
        _ => return None,
    };

    let (target, is_static) = target_of(call, src, target_arg_index);
    Some(IoOperationRow {
        file: String::new(),
        line,
        in_function: scopes.function_at(line).to_string(),
        kind: kind.to_string(),
        requires_runtime_analysis: !is_static,
        target,
        is_static,
        mode: String::new(),
    })
}

/// Literal target or `(None, false)` for computed arguments.
fn target_of(call: Node<'_>, src: &[u8], index: usize) -> (Option<String>, bool) {
    match call_arg_literal(call, src, index) {
        Some(value) => (Some(value), true),
        None => (None, false),
    }
}

/// Unwrap the Nth positional argument when it is a plain string literal.
fn call_arg_literal(call: Node<'_>, src: &[u8], index: usize) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let arg = args
        .children(&mut cursor)
        .filter(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")
        .nth(index)?;
    string_literal_value(arg, src)
}

/// Unwrap a keyword argument when its value is a plain string literal.
fn kwarg_literal(call: Node<'_>, src: &[u8], name: &str) -> Option<String> {
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

fn string_literal_value(node: Node<'_>, src: &[u8]) -> Option<String> {
    if node.kind() != "string" {
        return None;
    }
    // An f-string with interpolations is a computed value, not a literal.
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

fn text(node: Node<'_>, src: &[u8]) -> String {
    node.utf8_text(src).unwrap_or_default().to_string()
}
