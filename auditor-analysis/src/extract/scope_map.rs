//! Function scope map — shared input to every extractor that needs
//! `in_function` context.
//!
//! Two passes: the first collects `(start_line, end_line)` for every
//! function and method definition; the second maps a line to the
//! innermost enclosing function name. Top level maps to `"global"`.

use tree_sitter::Node;

use crate::scanner::language_detect::Language;

/// Sentinel scope for top-level code.
pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone)]
struct ScopeEntry {
    name: String,
    start_line: u32,
    end_line: u32,
}

/// Maps lines to their innermost enclosing function.
#[derive(Debug, Default)]
pub struct ScopeMap {
    entries: Vec<ScopeEntry>,
}

impl ScopeMap {
    /// First pass: collect every function/method span in the tree.
    ///
    /// Names are qualified through their lexical ancestors: methods as
    /// `Class.method`, nested functions as `outer.inner`.
    pub fn build(root: Node<'_>, source: &[u8], language: Language) -> Self {
        let mut entries = Vec::new();
        collect(root, source, language, &mut Vec::new(), &mut entries);
        // Innermost-first lookup: sort by span length ascending.
        entries.sort_by_key(|e| (e.end_line - e.start_line, e.start_line));
        Self { entries }
    }

    /// Second pass: innermost enclosing function for a line.
    pub fn function_at(&self, line: u32) -> &str {
        self.entries
            .iter()
            .find(|e| e.start_line <= line && line <= e.end_line)
            .map(|e| e.name.as_str())
            .unwrap_or(GLOBAL_SCOPE)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All collected scopes as `(name, start_line, end_line)`.
    pub fn spans(&self) -> impl Iterator<Item = (&str, u32, u32)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.name.as_str(), e.start_line, e.end_line))
    }
}

fn collect(
    node: Node<'_>,
    source: &[u8],
    language: Language,
    ancestry: &mut Vec<String>,
    entries: &mut Vec<ScopeEntry>,
) {
    let kind = node.kind();
    let own_name = match language {
        Language::Python => match kind {
            "function_definition" => name_of(node, source),
            "class_definition" => name_of(node, source),
            _ => None,
        },
        Language::JavaScript | Language::TypeScript => match kind {
            "function_declaration" | "generator_function_declaration" => name_of(node, source),
            "method_definition" => node
                .child_by_field_name("name")
                .map(|n| text(n, source)),
            "class_declaration" => name_of(node, source),
            // const f = () => {} / const f = function () {}
            "variable_declarator" => {
                let is_fn = node
                    .child_by_field_name("value")
                    .map(|v| matches!(v.kind(), "arrow_function" | "function_expression"))
                    .unwrap_or(false);
                if is_fn {
                    node.child_by_field_name("name").map(|n| text(n, source))
                } else {
                    None
                }
            }
            _ => None,
        },
        Language::Svelte => None,
    };

    let is_class = matches!(kind, "class_definition" | "class_declaration");
    let pushed = if let Some(name) = own_name {
        let qualified = if ancestry.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", ancestry.join("."), name)
        };
        if !is_class {
            entries.push(ScopeEntry {
                name: qualified.clone(),
                start_line: node.start_position().row as u32 + 1,
                end_line: node.end_position().row as u32 + 1,
            });
        }
        ancestry.push(name);
        true
    } else {
        false
    };

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect(child, source, language, ancestry, entries);
    }

    if pushed {
        ancestry.pop();
    }
}

fn name_of(node: Node<'_>, source: &[u8]) -> Option<String> {
    node.child_by_field_name("name").map(|n| text(n, source))
}

fn text(node: Node<'_>, source: &[u8]) -> String {
    node.utf8_text(source).unwrap_or_default().to_string()
}
