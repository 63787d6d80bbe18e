//! Taint engine orchestration.
//!
//! For each candidate source, Stage A runs first; when it finds no
//! reachable sink the expensive flow-sensitive stage is skipped
//! entirely. Sources are processed in parallel, each with its own
//! worklist; the Fact Store is read-only throughout, so no locking.

use auditor_core::cancel::CancelToken;
use auditor_core::config::TaintConfig;
use auditor_core::errors::TaintError;
use auditor_core::facts::rows::TaintFlowRow;
use auditor_core::traits::storage::IFactReader;
use auditor_core::types::collections::FxHashSet;
use rayon::prelude::*;

use super::index::ProjectIndex;
use super::registry::TaintRegistry;
use super::stage_a;
use super::stage_b::{self, CfgCache};
use super::types::{signature_key, SourceSite, TaintPath, TaintReport};

pub struct TaintEngine<'a> {
    store: &'a dyn IFactReader,
    registry: TaintRegistry,
    config: TaintConfig,
    cancel: CancelToken,
}

impl<'a> TaintEngine<'a> {
    pub fn new(
        store: &'a dyn IFactReader,
        registry: TaintRegistry,
        config: TaintConfig,
        cancel: CancelToken,
    ) -> Self {
        Self {
            store,
            registry,
            config,
            cancel,
        }
    }

    pub fn run(&self) -> Result<TaintReport, TaintError> {
        let index = ProjectIndex::build(self.store)?;
        let sources = self.find_sources(&index);
        let sinks_seen = self.count_sinks(&index);

        let per_source: Vec<Result<(Vec<TaintPath>, Vec<String>), TaintError>> = sources
            .par_iter()
            .map(|source| {
                if self.cancel.is_cancelled() {
                    return Ok((Vec::new(), Vec::new()));
                }
                // Stage A: cheap reachability; nothing reachable, done.
                let candidates =
                    stage_a::propagate(&index, &self.registry, source, &self.config);
                if candidates.is_empty() {
                    return Ok((Vec::new(), Vec::new()));
                }
                // Stage B: flow-sensitive re-derivation.
                let mut cfg_cache = CfgCache::new(self.store);
                let paths = stage_b::propagate(
                    &index,
                    &self.registry,
                    source,
                    &self.config,
                    &mut cfg_cache,
                )?;
                Ok((paths, cfg_cache.fallbacks))
            })
            .collect();

        let mut report = TaintReport {
            sources_seen: sources.len(),
            sinks_seen,
            cancelled: self.cancel.is_cancelled(),
            ..Default::default()
        };

        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut fallbacks: FxHashSet<String> = FxHashSet::default();
        for result in per_source {
            let (paths, source_fallbacks) = result?;
            for path in paths {
                if seen.insert(path.dedup_key()) {
                    report.paths.push(path);
                }
            }
            fallbacks.extend(source_fallbacks);
        }

        report.paths.sort_by(|a, b| {
            (
                &a.source.file,
                a.source.line,
                &a.sink.file,
                a.sink.line,
                signature_key(&a.call_stack),
            )
                .cmp(&(
                    &b.source.file,
                    b.source.line,
                    &b.sink.file,
                    b.sink.line,
                    signature_key(&b.call_stack),
                ))
        });
        report.cfg_fallbacks = {
            let mut v: Vec<String> = fallbacks.into_iter().collect();
            v.sort();
            v
        };
        Ok(report)
    }

    /// Candidate sources: assignments whose rhs matches a source rule,
    /// inside a known function.
    fn find_sources(&self, index: &ProjectIndex) -> Vec<SourceSite> {
        let mut sources = Vec::new();
        for function in index.functions() {
            for assign in &function.assignments {
                if let Some(rule) = self.registry.match_source(&assign.expression) {
                    sources.push(SourceSite {
                        file: function.file.clone(),
                        function: function.qualified_name.clone(),
                        line: assign.line,
                        variable: stage_a::base_var(&assign.target),
                        expression: assign.expression.clone(),
                        kind: rule.kind.clone(),
                    });
                }
            }
        }
        sources.sort_by(|a, b| (&a.file, a.line).cmp(&(&b.file, b.line)));
        sources
    }

    fn count_sinks(&self, index: &ProjectIndex) -> usize {
        index
            .functions()
            .flat_map(|f| f.calls.iter())
            .filter(|site| {
                self.registry
                    .match_sink(&site.call.receiver, &site.call.callee_name)
                    .is_some()
            })
            .count()
    }
}

/// Convert emitted paths to fact rows for the output sink.
pub fn to_rows(report: &TaintReport) -> Vec<TaintFlowRow> {
    report
        .paths
        .iter()
        .map(|p| TaintFlowRow {
            file: p.source.file.clone(),
            line: p.source.line,
            source_expression: p.source.expression.clone(),
            sink_file: p.sink.file.clone(),
            sink_line: p.sink.line,
            sink_expression: p.sink.expression.clone(),
            sink_kind: p.sink.kind.clone(),
            call_stack: serde_json::to_string(&p.call_stack).unwrap_or_else(|_| "[]".into()),
            depth: p.depth,
            requires_runtime_analysis: p.requires_runtime_analysis,
        })
        .collect()
}
