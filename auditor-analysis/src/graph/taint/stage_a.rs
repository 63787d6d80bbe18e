//! Stage A: flow-insensitive inter-procedural propagation.
//!
//! A worklist over argument passing and return flow. Each item carries
//! `(var, function, file, depth, call_path, call_signature)`; the
//! visited map keys on `(file, function, var)` with the set of call
//! signatures already processed for that key. A new item is enqueued
//! only if its signature is unseen for its state.

use std::collections::VecDeque;

use auditor_core::config::TaintConfig;
use auditor_core::types::collections::FxHashSet;

use super::index::{CallSite, FunctionFacts, ProjectIndex};
use super::registry::TaintRegistry;
use super::types::{CallFrame, CallSignature, SinkSite, SourceSite, TaintPath};
use super::visited::VisitedMap;

/// One worklist item.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub var: String,
    pub function: String,
    pub file: String,
    pub depth: u32,
    pub path: Vec<CallFrame>,
    pub signature: CallSignature,
}

/// Propagate one source to all reachable sinks, flow-insensitively.
pub fn propagate(
    index: &ProjectIndex,
    registry: &TaintRegistry,
    source: &SourceSite,
    config: &TaintConfig,
) -> Vec<TaintPath> {
    let max_depth = config.effective_max_depth();
    let recursion_limit = config.effective_recursion_limit();
    let mut visited = VisitedMap::new(config.effective_signature_cap());
    let mut paths = Vec::new();
    let mut emitted: FxHashSet<String> = FxHashSet::default();

    let origin = CallFrame {
        file: source.file.clone(),
        function: source.function.clone(),
        line: source.line,
    };
    let mut worklist = VecDeque::new();
    worklist.push_back(WorkItem {
        var: source.variable.clone(),
        function: source.function.clone(),
        file: source.file.clone(),
        depth: 0,
        path: vec![origin.clone()],
        signature: vec![origin],
    });

    while let Some(item) = worklist.pop_front() {
        let state_key = format!("{}|{}|{}", item.file, item.function, item.var);
        if !visited.insert(&state_key, &item.signature) {
            continue;
        }
        if re_entries(&item.path, &item.file, &item.function) > recursion_limit {
            continue;
        }
        let Some(function) = index.function(&item.file, &item.function) else {
            continue;
        };

        // Intra-procedural closure over assignments (flow-insensitive).
        let tainted = taint_closure(function, &item.var);

        for site in &function.calls {
            let tainted_args = tainted_arguments(site, &tainted);
            if tainted_args.is_empty() {
                continue;
            }

            // Sink?
            if let Some(rule) =
                registry.match_sink(&site.call.receiver, &site.call.callee_name)
            {
                let path = make_path(
                    source,
                    sink_of(function, site, &rule.kind),
                    &item,
                    max_depth,
                    false,
                );
                if emitted.insert(path.dedup_key()) {
                    paths.push(path);
                }
                continue;
            }

            // Halted hop: dynamic callee. Preserve the hop as evidence;
            // propagation does not continue through it.
            if site.call.callee_unresolved || site.call.requires_runtime_analysis {
                let path = make_path(
                    source,
                    sink_of(function, site, "dynamic_call"),
                    &item,
                    max_depth,
                    true,
                );
                if emitted.insert(path.dedup_key()) {
                    paths.push(path);
                }
                continue;
            }

            // Argument flow into a resolved callee.
            if item.depth >= max_depth {
                continue;
            }
            let Some(callee) = index.resolve_callee(&function.file, &site.call.callee_name)
            else {
                continue;
            };
            for (arg_positional, keyword) in &tainted_args {
                let Some(param) = param_for(callee, &site.call, *arg_positional, keyword)
                else {
                    continue;
                };
                let mut next = extend(&item, function, site.call.line, max_depth);
                next.var = param;
                next.function = callee.qualified_name.clone();
                next.file = callee.file.clone();
                worklist.push_back(next);
            }
        }

        // Return flow back to every caller.
        let returns_tainted = function.returns.iter().any(|ret| {
            read_vars(&ret.read_vars).iter().any(|v| tainted.contains(v))
        });
        if returns_tainted && item.depth < max_depth {
            for (caller, site) in index.callers_of(function) {
                let Some(receiver_var) = receiving_variable(caller, site) else {
                    continue;
                };
                let frame = CallFrame {
                    file: caller.file.clone(),
                    function: caller.qualified_name.clone(),
                    line: site.call.line,
                };
                let mut path = item.path.clone();
                path.push(frame);
                let signature = truncate(&path, max_depth);
                worklist.push_back(WorkItem {
                    var: receiver_var,
                    function: caller.qualified_name.clone(),
                    file: caller.file.clone(),
                    depth: item.depth + 1,
                    path,
                    signature,
                });
            }
        }
    }

    paths
}

/// Fixpoint of assignment propagation within one function.
pub fn taint_closure(function: &FunctionFacts, seed: &str) -> FxHashSet<String> {
    let mut tainted: FxHashSet<String> = FxHashSet::default();
    tainted.insert(base_var(seed));
    loop {
        let mut changed = false;
        for assign in &function.assignments {
            let target = base_var(&assign.target);
            if tainted.contains(&target) {
                continue;
            }
            if read_vars(&assign.read_vars).iter().any(|v| tainted.contains(v)) {
                tainted.insert(target);
                changed = true;
            }
        }
        if !changed {
            return tainted;
        }
    }
}

/// `(positional_index, keyword)` for every argument reading tainted vars.
pub fn tainted_arguments(
    site: &CallSite,
    tainted: &FxHashSet<String>,
) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    let mut positional = 0usize;
    let mut args: Vec<_> = site.args.iter().collect();
    args.sort_by_key(|a| a.arg_index);
    for arg in args {
        let is_keyword = !arg.keyword.is_empty();
        let reads_taint = read_vars(&arg.read_vars).iter().any(|v| tainted.contains(v));
        if reads_taint {
            out.push((positional, arg.keyword.clone()));
        }
        if !is_keyword {
            positional += 1;
        }
    }
    out
}

/// Map an argument to the callee's parameter name.
pub fn param_for(
    callee: &FunctionFacts,
    call: &auditor_core::facts::rows::CallRow,
    positional: usize,
    keyword: &str,
) -> Option<String> {
    if !keyword.is_empty() {
        return callee.params.iter().find(|p| *p == keyword).cloned();
    }
    // Method calls bind the receiver to the leading self/cls parameter.
    let offset = match callee.params.first().map(String::as_str) {
        Some("self") | Some("cls") if !call.receiver.is_empty() => 1,
        _ => 0,
    };
    callee.params.get(positional + offset).cloned()
}

/// The variable a caller binds the return value to, if any.
pub fn receiving_variable(caller: &FunctionFacts, site: &CallSite) -> Option<String> {
    caller
        .assignments
        .iter()
        .find(|a| a.line == site.call.line)
        .map(|a| base_var(&a.target))
}

pub fn sink_of(function: &FunctionFacts, site: &CallSite, kind: &str) -> SinkSite {
    let expression = if site.call.receiver.is_empty() {
        site.call.callee_name.clone()
    } else {
        format!("{}.{}", site.call.receiver, site.call.callee_name)
    };
    SinkSite {
        file: function.file.clone(),
        function: function.qualified_name.clone(),
        line: site.call.line,
        expression,
        kind: kind.to_string(),
    }
}

pub fn make_path(
    source: &SourceSite,
    sink: SinkSite,
    item: &WorkItem,
    max_depth: u32,
    requires_runtime_analysis: bool,
) -> TaintPath {
    let call_stack = emit_stack(&item.path, &sink, max_depth);
    TaintPath {
        source: source.clone(),
        sink,
        frames: item.path.clone(),
        call_stack,
        depth: item.depth,
        requires_runtime_analysis,
    }
}

/// The emitted stack ends at the sink: the propagation signature plus a
/// final frame inside the sink's function.
pub fn emit_stack(path: &[CallFrame], sink: &SinkSite, max_depth: u32) -> CallSignature {
    let mut stack = truncate(path, max_depth);
    stack.push(CallFrame {
        file: sink.file.clone(),
        function: sink.function.clone(),
        line: sink.line,
    });
    stack
}

/// New item one hop deeper, with the call frame appended to both the
/// path and the signature.
pub fn extend(
    item: &WorkItem,
    caller: &FunctionFacts,
    call_line: u32,
    max_depth: u32,
) -> WorkItem {
    let mut path = item.path.clone();
    path.push(CallFrame {
        file: caller.file.clone(),
        function: caller.qualified_name.clone(),
        line: call_line,
    });
    let signature = truncate(&path, max_depth);
    WorkItem {
        var: String::new(),
        function: String::new(),
        file: String::new(),
        depth: item.depth + 1,
        path,
        signature,
    }
}

/// A signature keeps at most `max_depth + 1` frames; the earliest
/// frames carry controller attribution and are retained.
pub fn truncate(path: &[CallFrame], max_depth: u32) -> CallSignature {
    path.iter().take(max_depth as usize + 1).cloned().collect()
}

/// Occurrences of `(file, function)` on the current path.
pub fn re_entries(path: &[CallFrame], file: &str, function: &str) -> u32 {
    path.iter()
        .filter(|f| f.file == file && f.function == function)
        .count()
        .saturating_sub(1) as u32
}

pub fn read_vars(json: &str) -> Vec<String> {
    serde_json::from_str(json).unwrap_or_default()
}

pub fn base_var(target: &str) -> String {
    target
        .split(['.', '[', '('])
        .next()
        .unwrap_or(target)
        .trim()
        .to_string()
}
