//! Shell execution with attacker-influencable input shape.

use auditor_core::errors::AnalysisError;
use auditor_core::facts::rows::FindingRow;
use auditor_core::traits::storage::IFactReader;

use crate::analyzers::Analyzer;

const RULE_ID: &str = "shell-exec";

const SHELL_CALLEES: &[&str] = &["system", "popen", "exec", "execSync", "spawnSync"];

pub struct ShellExec;

impl Analyzer for ShellExec {
    fn id(&self) -> &'static str {
        "shell_exec"
    }

    fn run(&self, store: &dyn IFactReader) -> Result<Vec<FindingRow>, AnalysisError> {
        let mut findings = Vec::new();

        for callee in SHELL_CALLEES {
            for call in store.calls_to(callee)? {
                findings.push(FindingRow {
                    file: call.file.clone(),
                    line: call.line,
                    rule_id: RULE_ID.to_string(),
                    severity: "high".to_string(),
                    message: format!("shell execution via `{}`", call.callee_name),
                    evidence: format!(
                        "{}({} args) in {}",
                        call.callee_name, call.argument_count, call.caller_function
                    ),
                    analyzer: "shell_exec".to_string(),
                });
            }
        }

        // subprocess.run(..., shell=True)
        for call in store.calls_to("run")? {
            if call.receiver != "subprocess" {
                continue;
            }
            let args = store.call_args_at(&call.file, call.line, &call.callee_name)?;
            let shell_true = args
                .iter()
                .any(|a| a.keyword == "shell" && a.expression == "True");
            if shell_true {
                findings.push(FindingRow {
                    file: call.file.clone(),
                    line: call.line,
                    rule_id: RULE_ID.to_string(),
                    severity: "high".to_string(),
                    message: "subprocess.run with shell=True".to_string(),
                    evidence: format!("in {}", call.caller_function),
                    analyzer: "shell_exec".to_string(),
                });
            }
        }

        Ok(findings)
    }
}
