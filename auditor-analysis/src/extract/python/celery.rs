//! Celery task-queue extraction: task declarations and beat schedules.
//!
//! Gated on a `celery` import, a task decorator, or the project tag.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{FactRow, JobRow, JobScheduleRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const FRAMEWORK: &str = "celery";

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag(FRAMEWORK)
        || contains(content, b"celery")
        || contains(content, b"shared_task")
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
    match node.kind() {
        "decorated_definition" => {
            extract_task(node, src, facts)?;
        }
        "assignment" => {
            // app.conf.beat_schedule = { "name": {"task": ..., "schedule": ...} }
            let target = node
                .child_by_field_name("left")
                .map(|n| text(n, src))
                .unwrap_or_default();
            if target.ends_with("beat_schedule") {
                if let Some(rhs) = node.child_by_field_name("right") {
                    extract_beat_schedule(rhs, src, facts)?;
                }
            }
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

fn extract_task(
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

    let mut cursor = decorated.walk();
    for deco in decorated.children(&mut cursor) {
        if deco.kind() != "decorator" {
            continue;
        }
        let deco_text = text(deco, src);
        let is_task = deco_text.contains(".task") || deco_text.contains("shared_task");
        if !is_task {
            continue;
        }

        let line = func.start_position().row as u32 + 1;
        let func_name = func
            .child_by_field_name("name")
            .map(|n| text(n, src))
            .unwrap_or_default();
        // @app.task(name="explicit.name", queue="emails")
        let (name, queue) = decorator_call(deco).map_or(
            (func_name.clone(), String::new()),
            |call| {
                (
                    kwarg_string(call, src, "name").unwrap_or(func_name.clone()),
                    kwarg_string(call, src, "queue").unwrap_or_default(),
                )
            },
        );

        facts.push(FactRow::Job(JobRow {
            file: String::new(),
            line,
            name,
            queue,
            framework: FRAMEWORK.to_string(),
        }))?;
        break;
    }
    Ok(())
}

fn extract_beat_schedule(
    dict: Node<'_>,
    src: &[u8],
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    if dict.kind() != "dictionary" {
        return Ok(());
    }
    let mut cursor = dict.walk();
    for pair in dict.children(&mut cursor) {
        if pair.kind() != "pair" {
            continue;
        }
        let Some(value) = pair.child_by_field_name("value") else { continue };
        if value.kind() != "dictionary" {
            continue;
        }
        let line = pair.start_position().row as u32 + 1;
        let mut task = String::new();
        let mut schedule = String::new();
        let mut c2 = value.walk();
        for entry in value.children(&mut c2) {
            if entry.kind() != "pair" {
                continue;
            }
            let key = entry
                .child_by_field_name("key")
                .and_then(|k| string_literal_value(k, src))
                .unwrap_or_default();
            let val = entry
                .child_by_field_name("value")
                .map(|v| text(v, src))
                .unwrap_or_default();
            match key.as_str() {
                "task" => task = val.trim_matches(['"', '\'']).to_string(),
                "schedule" => schedule = val,
                _ => {}
            }
        }
        if !task.is_empty() {
            facts.push(FactRow::JobSchedule(JobScheduleRow {
                file: String::new(),
                line,
                job_name: task,
                schedule,
                framework: FRAMEWORK.to_string(),
            }))?;
        }
    }
    Ok(())
}

/// The call node of a parenthesized decorator, if any.
fn decorator_call(deco: Node<'_>) -> Option<Node<'_>> {
    let mut cursor = deco.walk();
    let found = deco.children(&mut cursor).find(|c| c.kind() == "call");
    found
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
