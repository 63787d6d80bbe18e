//! Analyzer contract and execution.
//!
//! Analyzers are pure over a read-only store handle and deterministic.
//! A raised analyzer is marked failed in the report; the others
//! continue. Finding order follows the stable sort key
//! `(rule_id, file, line)`.

use auditor_core::cancel::CancelToken;
use auditor_core::errors::AnalysisError;
use auditor_core::facts::rows::FindingRow;
use auditor_core::traits::storage::IFactReader;
use rayon::prelude::*;
use serde::Serialize;

use super::rules;

/// A stateless analysis pass.
pub trait Analyzer: Send + Sync {
    /// Unique identifier, used in reports and failure records.
    fn id(&self) -> &'static str;

    /// Run against a read-only store handle.
    fn run(&self, store: &dyn IFactReader) -> Result<Vec<FindingRow>, AnalysisError>;
}

/// Aggregated result of an analyzer run.
#[derive(Debug, Default, Serialize)]
pub struct AnalyzerReport {
    pub findings: Vec<FindingRow>,
    /// `(analyzer id, rendered error)` for passes that raised.
    pub failed: Vec<(String, String)>,
    pub cancelled: bool,
}

/// All built-in analyzers.
pub fn builtin() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(rules::sql_strings::SqlStringBuild),
        Box::new(rules::shell_exec::ShellExec),
        Box::new(rules::endpoint_contract::EndpointContract),
        Box::new(rules::dynamic_io::DynamicIoTargets),
    ]
}

/// Run analyzers concurrently; each is internally single-threaded.
pub fn run_all(
    store: &(dyn IFactReader),
    analyzers: &[Box<dyn Analyzer>],
    cancel: &CancelToken,
) -> AnalyzerReport {
    let results: Vec<(&'static str, Result<Vec<FindingRow>, AnalysisError>)> = analyzers
        .par_iter()
        .map(|analyzer| {
            if cancel.is_cancelled() {
                return (analyzer.id(), Err(AnalysisError::Cancelled));
            }
            (analyzer.id(), analyzer.run(store))
        })
        .collect();

    let mut report = AnalyzerReport {
        cancelled: cancel.is_cancelled(),
        ..Default::default()
    };
    for (id, result) in results {
        match result {
            Ok(findings) => report.findings.extend(findings),
            Err(AnalysisError::Cancelled) => report.cancelled = true,
            Err(e) => {
                tracing::warn!(analyzer = id, error = %e, "analyzer failed");
                report.failed.push((id.to_string(), e.to_string()));
            }
        }
    }

    report
        .findings
        .sort_by(|a, b| {
            (&a.rule_id, &a.file, a.line).cmp(&(&b.rule_id, &b.file, b.line))
        });
    report
}
