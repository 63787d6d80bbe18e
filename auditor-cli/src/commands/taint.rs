//! `aud taint`.

use std::path::Path;

use auditor_analysis::pipeline;
use auditor_core::cancel::CancelToken;
use auditor_core::config::AuditorConfig;

use crate::exit;

pub fn run(root: &Path) -> i32 {
    let config = match AuditorConfig::load(root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: bad .pf/config.toml: {e}");
            return exit::USER_ERROR;
        }
    };

    let cancel = CancelToken::new();
    match pipeline::run_taint(root, &config, &cancel) {
        Ok(report) => {
            println!(
                "{} taint paths ({} sources, {} sinks)",
                report.paths.len(),
                report.sources_seen,
                report.sinks_seen
            );
            for path in &report.paths {
                println!(
                    "{}:{} -> {}:{} [{}] depth {}",
                    path.source.file,
                    path.source.line,
                    path.sink.file,
                    path.sink.line,
                    path.sink.kind,
                    path.depth
                );
            }
            if report.cancelled {
                return exit::CANCELLED;
            }
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            exit::code_for(&e)
        }
    }
}
