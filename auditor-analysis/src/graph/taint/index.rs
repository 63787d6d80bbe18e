//! In-memory project index for the taint engine.
//!
//! The Fact Store is read-only during taint analysis; the engine loads
//! what it needs once and propagates against memory.

use auditor_core::errors::StorageError;
use auditor_core::facts::rows::{AssignmentRow, CallArgRow, CallRow, ReturnRow};
use auditor_core::traits::storage::IFactReader;
use auditor_core::types::collections::FxHashMap;

/// One call site with its arguments.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub call: CallRow,
    pub args: Vec<CallArgRow>,
}

/// Everything the engine needs about one function.
#[derive(Debug, Clone)]
pub struct FunctionFacts {
    pub file: String,
    pub qualified_name: String,
    pub name: String,
    pub params: Vec<String>,
    pub line: u32,
    pub end_line: u32,
    pub assignments: Vec<AssignmentRow>,
    pub calls: Vec<CallSite>,
    pub returns: Vec<ReturnRow>,
}

/// Project-wide function index keyed `(file, qualified_name)`.
pub struct ProjectIndex {
    functions: FxHashMap<(String, String), FunctionFacts>,
    by_name: FxHashMap<String, Vec<(String, String)>>,
}

impl ProjectIndex {
    pub fn build(store: &dyn IFactReader) -> Result<Self, StorageError> {
        let mut functions = FxHashMap::default();
        let mut by_name: FxHashMap<String, Vec<(String, String)>> = FxHashMap::default();

        for file in store.load_files()? {
            let symbols = store.symbols_by_file(&file.path)?;
            let calls = store.calls_by_file(&file.path)?;

            for symbol in &symbols {
                if symbol.kind != "function" && symbol.kind != "method" {
                    continue;
                }
                let params: Vec<String> =
                    serde_json::from_str(&symbol.params).unwrap_or_default();

                let mut call_sites = Vec::new();
                for call in calls
                    .iter()
                    .filter(|c| c.caller_function == symbol.qualified_name)
                {
                    let args =
                        store.call_args_at(&call.file, call.line, &call.callee_name)?;
                    call_sites.push(CallSite {
                        call: call.clone(),
                        args,
                    });
                }

                let facts = FunctionFacts {
                    file: file.path.clone(),
                    qualified_name: symbol.qualified_name.clone(),
                    name: symbol.name.clone(),
                    params,
                    line: symbol.line,
                    end_line: symbol.end_line,
                    assignments: store
                        .assignments_in(&file.path, &symbol.qualified_name)?,
                    calls: call_sites,
                    returns: store.returns_in(&file.path, &symbol.qualified_name)?,
                };

                by_name
                    .entry(symbol.name.clone())
                    .or_default()
                    .push((file.path.clone(), symbol.qualified_name.clone()));
                functions.insert(
                    (file.path.clone(), symbol.qualified_name.clone()),
                    facts,
                );
            }
        }

        // Deterministic candidate order for ambiguous names.
        for candidates in by_name.values_mut() {
            candidates.sort();
        }

        Ok(Self { functions, by_name })
    }

    pub fn function(&self, file: &str, qualified_name: &str) -> Option<&FunctionFacts> {
        self.functions
            .get(&(file.to_string(), qualified_name.to_string()))
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionFacts> + '_ {
        let mut keys: Vec<&(String, String)> = self.functions.keys().collect();
        keys.sort();
        keys.into_iter().map(move |k| &self.functions[k])
    }

    /// Resolution chain for a call: same-file match first, then a unique
    /// project-wide match. Ambiguous names stay unresolved.
    pub fn resolve_callee(&self, caller_file: &str, callee_name: &str) -> Option<&FunctionFacts> {
        let candidates = self.by_name.get(callee_name)?;
        if let Some((file, qualified)) =
            candidates.iter().find(|(file, _)| file == caller_file)
        {
            return self.function(file, qualified);
        }
        if candidates.len() == 1 {
            let (file, qualified) = &candidates[0];
            return self.function(file, qualified);
        }
        None
    }

    /// Call sites across the project that invoke `function_name`,
    /// resolved back to that definition. Used for return flow.
    pub fn callers_of(&self, callee: &FunctionFacts) -> Vec<(&FunctionFacts, &CallSite)> {
        let mut out = Vec::new();
        for caller in self.functions() {
            for site in &caller.calls {
                if site.call.callee_name != callee.name {
                    continue;
                }
                let resolved = self.resolve_callee(&caller.file, &site.call.callee_name);
                if let Some(resolved) = resolved {
                    if resolved.file == callee.file
                        && resolved.qualified_name == callee.qualified_name
                    {
                        out.push((caller, site));
                    }
                }
            }
        }
        out
    }
}
