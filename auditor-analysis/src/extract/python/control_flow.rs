//! Control-flow facts: per-function CFG blocks and edges, loop metrics.
//!
//! The CFG is statement-granular at the top level of each function body:
//! linear runs collapse into one block, branches and loops get their own
//! blocks with typed edges. Nested control flow inside a branch stays
//! inside that branch's block span — line→block mapping remains total.

use auditor_core::errors::ContractViolation;
use auditor_core::facts::rows::{CfgBlockRow, CfgEdgeRow, FactRow, LoopMetricRow};
use auditor_core::facts::staging::FileFacts;
use tree_sitter::Node;

use crate::extract::scope_map::ScopeMap;
use crate::extract::FileInfo;
use crate::parsers::ParsedTree;

pub fn extract(
    _info: &FileInfo,
    _content: &[u8],
    tree: &ParsedTree,
    scopes: &ScopeMap,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    walk(tree.root(), scopes, 0, facts)
}

fn walk(
    node: Node<'_>,
    scopes: &ScopeMap,
    loop_depth: u32,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let line = node.start_position().row as u32 + 1;

    match node.kind() {
        "function_definition" => {
            let function = scopes.function_at(line).to_string();
            if let Some(body) = node.child_by_field_name("body") {
                build_cfg(node, body, &function, facts)?;
            }
        }
        "for_statement" | "while_statement" => {
            let depth = loop_depth + 1;
            facts.push(FactRow::LoopMetric(LoopMetricRow {
                file: String::new(),
                line,
                in_function: scopes.function_at(line).to_string(),
                kind: if node.kind() == "for_statement" { "for" } else { "while" }
                    .to_string(),
                depth,
                has_early_exit: has_early_exit(node),
            }))?;
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                walk(child, scopes, depth, facts)?;
            }
            return Ok(());
        }
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk(child, scopes, loop_depth, facts)?;
    }
    Ok(())
}

struct CfgBuilder {
    function: String,
    blocks: Vec<CfgBlockRow>,
    edges: Vec<CfgEdgeRow>,
}

impl CfgBuilder {
    fn block(&mut self, kind: &str, line: u32, end_line: u32) -> u32 {
        let index = self.blocks.len() as u32;
        self.blocks.push(CfgBlockRow {
            file: String::new(),
            function: self.function.clone(),
            block_index: index,
            kind: kind.to_string(),
            line,
            end_line,
        });
        index
    }

    fn edge(&mut self, from: u32, to: u32, kind: &str, line: u32) {
        self.edges.push(CfgEdgeRow {
            file: String::new(),
            function: self.function.clone(),
            from_block: from,
            to_block: to,
            kind: kind.to_string(),
            line,
        });
    }
}

fn build_cfg(
    func: Node<'_>,
    body: Node<'_>,
    function: &str,
    facts: &mut FileFacts,
) -> Result<(), ContractViolation> {
    let mut b = CfgBuilder {
        function: function.to_string(),
        blocks: Vec::new(),
        edges: Vec::new(),
    };

    let def_line = func.start_position().row as u32 + 1;
    let entry = b.block("entry", def_line, def_line);
    let mut current = entry;
    // Open linear run; flushed when control flow interrupts it.
    let mut run_start: Option<(u32, u32)> = None;

    let mut cursor = body.walk();
    let statements: Vec<Node<'_>> = body.children(&mut cursor).filter(|n| n.is_named()).collect();

    for stmt in statements {
        let s_line = stmt.start_position().row as u32 + 1;
        let s_end = stmt.end_position().row as u32 + 1;

        match stmt.kind() {
            "if_statement" => {
                current = flush_run(&mut b, current, &mut run_start);
                let branch = b.block("branch", s_line, s_end);
                b.edge(current, branch, "fallthrough", s_line);

                let join = b.block("body", s_end, s_end);
                if let Some(consequence) = stmt.child_by_field_name("consequence") {
                    let then_block = b.block(
                        "body",
                        consequence.start_position().row as u32 + 1,
                        consequence.end_position().row as u32 + 1,
                    );
                    b.edge(branch, then_block, "true", s_line);
                    b.edge(then_block, join, "fallthrough", s_end);
                }
                let mut alt_found = false;
                let mut c2 = stmt.walk();
                for child in stmt.children(&mut c2) {
                    if matches!(child.kind(), "else_clause" | "elif_clause") {
                        let else_block = b.block(
                            "body",
                            child.start_position().row as u32 + 1,
                            child.end_position().row as u32 + 1,
                        );
                        b.edge(branch, else_block, "false", s_line);
                        b.edge(else_block, join, "fallthrough", s_end);
                        alt_found = true;
                    }
                }
                if !alt_found {
                    b.edge(branch, join, "false", s_line);
                }
                current = join;
            }
            "for_statement" | "while_statement" => {
                current = flush_run(&mut b, current, &mut run_start);
                let loop_block = b.block("loop", s_line, s_end);
                b.edge(current, loop_block, "fallthrough", s_line);
                b.edge(loop_block, loop_block, "loop_back", s_end);
                let after = b.block("body", s_end, s_end);
                b.edge(loop_block, after, "fallthrough", s_end);
                current = after;
            }
            "try_statement" => {
                current = flush_run(&mut b, current, &mut run_start);
                let try_block = b.block("body", s_line, s_end);
                b.edge(current, try_block, "fallthrough", s_line);
                let mut c2 = stmt.walk();
                let mut join = try_block;
                for child in stmt.children(&mut c2) {
                    if matches!(child.kind(), "except_clause" | "finally_clause") {
                        let handler = b.block(
                            "body",
                            child.start_position().row as u32 + 1,
                            child.end_position().row as u32 + 1,
                        );
                        b.edge(try_block, handler, "exception", s_line);
                        join = handler;
                    }
                }
                current = join;
            }
            "return_statement" | "raise_statement" => {
                // Terminates the run; the exit edge is added below.
                run_start = Some(match run_start {
                    Some((start, _)) => (start, s_end),
                    None => (s_line, s_end),
                });
                current = flush_run(&mut b, current, &mut run_start);
            }
            _ => {
                run_start = Some(match run_start {
                    Some((start, _)) => (start, s_end),
                    None => (s_line, s_end),
                });
            }
        }
    }

    current = flush_run(&mut b, current, &mut run_start);
    let end_line = func.end_position().row as u32 + 1;
    let exit = b.block("exit", end_line, end_line);
    b.edge(current, exit, "fallthrough", end_line);

    for block in b.blocks {
        facts.push(FactRow::CfgBlock(block))?;
    }
    for edge in b.edges {
        facts.push(FactRow::CfgEdge(edge))?;
    }
    Ok(())
}

/// Close the open linear run into a body block chained from `current`.
fn flush_run(b: &mut CfgBuilder, current: u32, run: &mut Option<(u32, u32)>) -> u32 {
    match run.take() {
        Some((start, end)) => {
            let block = b.block("body", start, end);
            b.edge(current, block, "fallthrough", start);
            block
        }
        None => current,
    }
}

fn has_early_exit(loop_node: Node<'_>) -> bool {
    let mut stack = vec![loop_node];
    let mut first = true;
    while let Some(node) = stack.pop() {
        if !first && matches!(node.kind(), "break_statement" | "return_statement") {
            return true;
        }
        // Do not descend into nested functions; their exits are their own.
        if !first && node.kind() == "function_definition" {
            continue;
        }
        first = false;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            stack.push(child);
        }
    }
    false
}
