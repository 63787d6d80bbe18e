//! `aud index`.

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
    match pipeline::run_index(root, &config, &cancel) {
        Ok(outcome) => {
            println!(
                "indexed {} tables, {} rows",
                outcome.receipt.tables.len(),
                outcome.receipt.total_rows()
            );
            if !outcome.frameworks.is_empty() {
                println!("frameworks: {}", outcome.frameworks.join(", "));
            }
            for (file, error) in &outcome.parse_failures {
                eprintln!("parse failed: {file}: {error}");
            }
            for (table, dropped) in &outcome.truncated {
                eprintln!("warning: {dropped} duplicate rows truncated in {table}");
            }
            // End-of-run summary: counts per error kind.
            let truncated_total: usize = outcome.truncated.values().sum();
            println!(
                "summary: {} parse failures, {} truncated rows",
                outcome.parse_failures.len(),
                truncated_total
            );
            if outcome.cancelled {
                eprintln!("cancelled: partial index");
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
