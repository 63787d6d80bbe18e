//! SQLAlchemy ORM extraction: models, columns, associations.
//!
//! Gated on an in-file `sqlalchemy` import or the project-level tag.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{
    FactRow, OrmAssociationRow, OrmFieldRow, OrmModelRow,
};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

const FRAMEWORK: &str = "sqlalchemy";

pub fn gate(info: &FileInfo, content: &[u8]) -> bool {
    info.has_tag(FRAMEWORK) || contains(content, b"sqlalchemy")
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
    if node.kind() == "class_definition" && is_model(node, src) {
        extract_model(node, src, facts)?;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, src, facts)?;
    }
    Ok(())
}

/// A model subclasses a declarative base: `Base`, `db.Model`, or a
/// `DeclarativeBase` descendant.
fn is_model(class: Node<'_>, src: &[u8]) -> bool {
    let Some(bases) = class.child_by_field_name("superclasses") else {
        return false;
    };
    let bases_text = text(bases, src);
    bases_text.contains("Base") || bases_text.contains("db.Model")
}

fn extract_model(
    class: Node<'_>,
    src: &[u8],
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let line = class.start_position().row as u32 + 1;
    let model = class
        .child_by_field_name("name")
        .map(|n| text(n, src))
        .unwrap_or_default();

    let mut table_name = String::new();
    let Some(body) = class.child_by_field_name("body") else {
        return Ok(());
    };

    // Class-level assignments: __tablename__, Column(...), relationship(...)
    let mut cursor = body.walk();
    for stmt in body.children(&mut cursor) {
        let Some(assign) = find_assignment(stmt) else { continue };
        let a_line = assign.start_position().row as u32 + 1;
        let target = assign
            .child_by_field_name("left")
            .map(|n| text(n, src))
            .unwrap_or_default();
        let Some(rhs) = assign.child_by_field_name("right") else { continue };

        if target == "__tablename__" {
            if let Some(value) = string_literal_value(rhs, src) {
                table_name = value;
            }
            continue;
        }

        if rhs.kind() != "call" {
            continue;
        }
        let callee = rhs
            .child_by_field_name("function")
            .map(|n| text(n, src))
            .unwrap_or_default();

        if callee == "Column" || callee.ends_with(".Column") || callee == "mapped_column" {
            let column_type = first_positional_text(rhs, src).unwrap_or_default();
            facts.push(FactRow::OrmField(OrmFieldRow {
                file: String::new(),
                line: a_line,
                model: model.clone(),
                name: target.clone(),
                column_type,
                nullable: kwarg_is_true(rhs, src, "nullable"),
                primary_key: kwarg_is_true(rhs, src, "primary_key"),
            }))?;

            // ForeignKey("other.id") inside the Column arguments.
            if let Some(fk_target) = foreign_key_target(rhs, src) {
                facts.push(FactRow::OrmAssociation(OrmAssociationRow {
                    file: String::new(),
                    line: a_line,
                    model: model.clone(),
                    kind: "foreign_key".to_string(),
                    target: fk_target,
                }))?;
            }
        } else if callee == "relationship" || callee.ends_with(".relationship") {
            if let Some(target_model) = first_positional_string(rhs, src) {
                facts.push(FactRow::OrmAssociation(OrmAssociationRow {
                    file: String::new(),
                    line: a_line,
                    model: model.clone(),
                    kind: "relationship".to_string(),
                    target: target_model,
                }))?;
            }
            if let Some(backref) = kwarg_string(rhs, src, "backref") {
                facts.push(FactRow::OrmAssociation(OrmAssociationRow {
                    file: String::new(),
                    line: a_line,
                    model: model.clone(),
                    kind: "backref".to_string(),
                    target: backref,
                }))?;
            }
        }
    }

    facts.push(FactRow::OrmModel(OrmModelRow {
        file: String::new(),
        line,
        name: model,
        table_name,
        framework: FRAMEWORK.to_string(),
    }))?;
    Ok(())
}

/// Unwrap `expression_statement > assignment`.
fn find_assignment(stmt: Node<'_>) -> Option<Node<'_>> {
    if stmt.kind() == "assignment" {
        return Some(stmt);
    }
    if stmt.kind() == "expression_statement" {
        let mut cursor = stmt.walk();
        let found = stmt
            .children(&mut cursor)
            .find(|c| c.kind() == "assignment");
        return found;
    }
    None
}

fn foreign_key_target(call: Node<'_>, src: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    for child in args.children(&mut cursor) {
        if child.kind() == "call" {
            let callee = child
                .child_by_field_name("function")
                .map(|n| text(n, src))
                .unwrap_or_default();
            if callee == "ForeignKey" || callee.ends_with(".ForeignKey") {
                return first_positional_string(child, src);
            }
        }
    }
    None
}

fn first_positional_text(call: Node<'_>, src: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let result = args
        .children(&mut cursor)
        .find(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")
        .map(|c| text(c, src));
    result
}

fn first_positional_string(call: Node<'_>, src: &[u8]) -> Option<String> {
    let args = call.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let first = args
        .children(&mut cursor)
        .find(|c| c.is_named() && c.kind() != "keyword_argument" && c.kind() != "comment")?;
    string_literal_value(first, src)
}

fn kwarg_is_true(call: Node<'_>, src: &[u8], name: &str) -> bool {
    kwarg_value_text(call, src, name)
        .map(|v| v == "True")
        .unwrap_or(false)
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
