//! I/O operations whose target is computed at runtime.
//!
//! These rows carry `is_static=false`; static analysis can say where
//! the operation happens but not what it touches, so each one surfaces
//! as a low-severity finding flagged for runtime confirmation.

use auditor_core::errors::AnalysisError;
use auditor_core::facts::rows::FindingRow;
use auditor_core::traits::storage::IFactReader;

use crate::analyzers::Analyzer;

const RULE_ID: &str = "io-dynamic-target";

pub struct DynamicIoTargets;

impl Analyzer for DynamicIoTargets {
    fn id(&self) -> &'static str {
        "dynamic_io"
    }

    fn run(&self, store: &dyn IFactReader) -> Result<Vec<FindingRow>, AnalysisError> {
        let mut findings = Vec::new();
        for op in store.io_operations()? {
            if op.is_static {
                continue;
            }
            findings.push(FindingRow {
                file: op.file.clone(),
                line: op.line,
                rule_id: RULE_ID.to_string(),
                severity: "low".to_string(),
                message: format!(
                    "{} with a computed target in {}",
                    op.kind, op.in_function
                ),
                evidence: "target requires runtime analysis".to_string(),
                analyzer: "dynamic_io".to_string(),
            });
        }
        Ok(findings)
    }
}
