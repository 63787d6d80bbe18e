//! `aud analyze`.

use std::path::Path;

use auditor_analysis::pipeline;
use auditor_core::cancel::CancelToken;

use crate::exit;

pub fn run(root: &Path) -> i32 {
    let cancel = CancelToken::new();
    match pipeline::run_analyze(root, &cancel) {
        Ok(report) => {
            println!("{} findings", report.findings.len());
            for finding in &report.findings {
                println!(
                    "{}:{} [{}] {}",
                    finding.file, finding.line, finding.rule_id, finding.message
                );
            }
            for (analyzer, error) in &report.failed {
                eprintln!("analyzer {analyzer} failed: {error}");
            }
            if report.cancelled {
                return exit::CANCELLED;
            }
            if report.failed.is_empty() {
                exit::SUCCESS
            } else {
                exit::ANALYSIS_FAILURE
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit::code_for(&e)
        }
    }
}
