//! Stage B: flow-sensitive, CFG-aware propagation.
//!
//! Worklist items carry `(file, function, tainted_vars, depth,
//! call_path, call_signature)`; visited keys on the variable set. Within
//! a function, taint only reaches a use site when the CFG admits a path
//! from the introduction line to the use line. Functions without CFG
//! metadata fall back to Stage A semantics, logged once per function.

use std::collections::{BTreeMap, VecDeque};

use auditor_core::config::TaintConfig;
use auditor_core::errors::TaintError;
use auditor_core::traits::storage::IFactReader;
use auditor_core::types::collections::{FxHashMap, FxHashSet};

use crate::graph::cfg::FunctionCfg;

use super::index::{FunctionFacts, ProjectIndex};
use super::registry::TaintRegistry;
use super::stage_a;
use super::types::{CallFrame, CallSignature, SourceSite, TaintPath};
use super::visited::VisitedMap;

/// One worklist item: a set of tainted variables in a function, each
/// with the line its taint was introduced at.
#[derive(Debug, Clone)]
struct WorkItem {
    file: String,
    function: String,
    tainted: BTreeMap<String, u32>,
    depth: u32,
    path: Vec<CallFrame>,
    signature: CallSignature,
}

/// CFG cache with once-per-function fallback logging.
pub struct CfgCache<'a> {
    store: &'a dyn IFactReader,
    cfgs: FxHashMap<(String, String), Option<FunctionCfg>>,
    pub fallbacks: Vec<String>,
}

impl<'a> CfgCache<'a> {
    pub fn new(store: &'a dyn IFactReader) -> Self {
        Self {
            store,
            cfgs: FxHashMap::default(),
            fallbacks: Vec::new(),
        }
    }

    fn get(&mut self, file: &str, function: &str) -> Result<Option<&FunctionCfg>, TaintError> {
        let key = (file.to_string(), function.to_string());
        if !self.cfgs.contains_key(&key) {
            let cfg = FunctionCfg::load(self.store, file, function)?;
            if cfg.is_none() {
                let name = format!("{file}::{function}");
                tracing::warn!(
                    function = %name,
                    "no CFG metadata; falling back to flow-insensitive propagation"
                );
                self.fallbacks.push(name);
            }
            self.cfgs.insert(key.clone(), cfg);
        }
        Ok(self.cfgs.get(&key).and_then(|c| c.as_ref()))
    }
}

/// Whether taint introduced at `intro` can reach `use_line`.
fn reachable(cfg: Option<&FunctionCfg>, intro: u32, use_line: u32) -> bool {
    match cfg {
        Some(cfg) => cfg.line_reachable(intro, use_line),
        // Stage A semantics when no CFG exists.
        None => true,
    }
}

/// Propagate one source flow-sensitively.
pub fn propagate(
    index: &ProjectIndex,
    registry: &TaintRegistry,
    source: &SourceSite,
    config: &TaintConfig,
    cfg_cache: &mut CfgCache<'_>,
) -> Result<Vec<TaintPath>, TaintError> {
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
    let mut initial = BTreeMap::new();
    initial.insert(stage_a::base_var(&source.variable), source.line);

    let mut worklist = VecDeque::new();
    worklist.push_back(WorkItem {
        file: source.file.clone(),
        function: source.function.clone(),
        tainted: initial,
        depth: 0,
        path: vec![origin.clone()],
        signature: vec![origin],
    });

    while let Some(mut item) = worklist.pop_front() {
        let vars: Vec<&str> = item.tainted.keys().map(String::as_str).collect();
        let state_key = format!("{}|{}|{}", item.file, item.function, vars.join(","));
        if !visited.insert(&state_key, &item.signature) {
            continue;
        }
        if stage_a::re_entries(&item.path, &item.file, &item.function) > recursion_limit {
            continue;
        }
        let Some(function) = index.function(&item.file, &item.function) else {
            continue;
        };
        let cfg_loaded = cfg_cache.get(&item.file, &item.function)?;

        // Flow-sensitive closure: assignments in line order, feasibility
        // checked from each variable's introduction line.
        let mut assignments = function.assignments.clone();
        assignments.sort_by_key(|a| a.line);
        loop {
            let mut changed = false;
            for assign in &assignments {
                let target = stage_a::base_var(&assign.target);
                if item.tainted.contains_key(&target) {
                    continue;
                }
                let feeds = stage_a::read_vars(&assign.read_vars).into_iter().any(|v| {
                    item.tainted
                        .get(&v)
                        .is_some_and(|&intro| reachable(cfg_loaded, intro, assign.line))
                });
                if feeds {
                    item.tainted.insert(target, assign.line);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        for site in &function.calls {
            let tainted_set: FxHashSet<String> = item
                .tainted
                .iter()
                .filter(|(_, &intro)| reachable(cfg_loaded, intro, site.call.line))
                .map(|(v, _)| v.clone())
                .collect();
            let tainted_args = stage_a::tainted_arguments(site, &tainted_set);
            if tainted_args.is_empty() {
                continue;
            }

            if let Some(rule) =
                registry.match_sink(&site.call.receiver, &site.call.callee_name)
            {
                let path = make_path(source, function, site, &rule.kind, &item, max_depth, false);
                if emitted.insert(path.dedup_key()) {
                    paths.push(path);
                }
                continue;
            }

            if site.call.callee_unresolved || site.call.requires_runtime_analysis {
                let path =
                    make_path(source, function, site, "dynamic_call", &item, max_depth, true);
                if emitted.insert(path.dedup_key()) {
                    paths.push(path);
                }
                continue;
            }

            if item.depth >= max_depth {
                continue;
            }
            let Some(callee) = index.resolve_callee(&function.file, &site.call.callee_name)
            else {
                continue;
            };
            let mut callee_tainted = BTreeMap::new();
            for (positional, keyword) in &tainted_args {
                if let Some(param) = stage_a::param_for(callee, &site.call, *positional, keyword)
                {
                    // Parameters are tainted at function entry.
                    callee_tainted.insert(param, callee.line);
                }
            }
            if callee_tainted.is_empty() {
                continue;
            }
            let mut path = item.path.clone();
            path.push(CallFrame {
                file: function.file.clone(),
                function: function.qualified_name.clone(),
                line: site.call.line,
            });
            let signature = stage_a::truncate(&path, max_depth);
            worklist.push_back(WorkItem {
                file: callee.file.clone(),
                function: callee.qualified_name.clone(),
                tainted: callee_tainted,
                depth: item.depth + 1,
                path,
                signature,
            });
        }

        // Return flow.
        let returns_tainted = function.returns.iter().any(|ret| {
            stage_a::read_vars(&ret.read_vars).into_iter().any(|v| {
                item.tainted
                    .get(&v)
                    .is_some_and(|&intro| reachable(cfg_loaded, intro, ret.line))
            })
        });
        if returns_tainted && item.depth < max_depth {
            for (caller, site) in index.callers_of(function) {
                let Some(receiver_var) = stage_a::receiving_variable(caller, site) else {
                    continue;
                };
                let mut path = item.path.clone();
                path.push(CallFrame {
                    file: caller.file.clone(),
                    function: caller.qualified_name.clone(),
                    line: site.call.line,
                });
                let signature = stage_a::truncate(&path, max_depth);
                let mut tainted = BTreeMap::new();
                tainted.insert(receiver_var, site.call.line);
                worklist.push_back(WorkItem {
                    file: caller.file.clone(),
                    function: caller.qualified_name.clone(),
                    tainted,
                    depth: item.depth + 1,
                    path,
                    signature,
                });
            }
        }
    }

    Ok(paths)
}

fn make_path(
    source: &SourceSite,
    function: &FunctionFacts,
    site: &super::index::CallSite,
    kind: &str,
    item: &WorkItem,
    max_depth: u32,
    requires_runtime_analysis: bool,
) -> TaintPath {
    let sink = stage_a::sink_of(function, site, kind);
    let call_stack = stage_a::emit_stack(&item.path, &sink, max_depth);
    TaintPath {
        source: source.clone(),
        sink,
        frames: item.path.clone(),
        call_stack,
        depth: item.depth,
        requires_runtime_analysis,
    }
}
