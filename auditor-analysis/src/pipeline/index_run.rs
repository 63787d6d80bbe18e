//! The `index`, `analyze`, and `taint` pipelines.
//!
//! Extraction workers run in parallel, each owning its per-file staging
//! buffer; finished buffers flow through a bounded channel to the
//! normalizer, which is the single writer to the Fact Store.

use std::collections::BTreeMap;
use std::path::Path;

use auditor_core::cancel::CancelToken;
use auditor_core::config::AuditorConfig;
use auditor_core::errors::{ContractViolation, ScanError, StorageError, TaintError};
use auditor_core::facts::rows::{FactRow, FileRow};
use auditor_core::facts::staging::FileFacts;
use auditor_core::traits::storage::IOutputSink;
use auditor_core::types::identifiers::content_hash;
use auditor_storage::{FactStore, Receipt};
use crossbeam_channel as channel;
use rayon::prelude::*;

use crate::analyzers;
use crate::extract::{self, FileInfo};
use crate::frameworks::detector;
use crate::graph::taint::{engine as taint_engine, TaintEngine, TaintRegistry, TaintReport};
use crate::normalize::{paths, Normalizer};
use crate::parsers::ParserManager;
use crate::scanner::walker;

use super::layout;

const STAGING_QUEUE_BOUND: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Taint(#[from] TaintError),
    #[error("io error on {path}: {message}")]
    Io { path: String, message: String },
}

impl From<ContractViolation> for PipelineError {
    fn from(value: ContractViolation) -> Self {
        Self::Storage(value.into())
    }
}

/// Outcome of one `index` run.
#[derive(Debug)]
pub struct IndexOutcome {
    pub receipt: Receipt,
    /// `(file, error)` per file whose parse failed.
    pub parse_failures: Vec<(String, String)>,
    /// Cross-file dedup truncations per table (non-strict mode).
    pub truncated: BTreeMap<String, usize>,
    pub frameworks: Vec<String>,
    pub cancelled: bool,
}

/// Parse, extract, normalize, flush. The store is recreated from
/// scratch; the receipt is written to `.pf/` and snapshotted under
/// `.pf/history/`.
pub fn run_index(
    root: &Path,
    config: &AuditorConfig,
    cancel: &CancelToken,
) -> Result<IndexOutcome, PipelineError> {
    let files = walker::walk_directory(root, &config.index, cancel)?;

    let relative_paths: Vec<String> = files
        .iter()
        .map(|f| paths::canonical_relative(root, &f.path))
        .collect();
    let manifest_text = detector::read_manifest_text(root);
    let frameworks = detector::detect_frameworks(&relative_paths, &manifest_text);

    std::fs::create_dir_all(layout::pf_dir(root)).map_err(|e| PipelineError::Io {
        path: layout::pf_dir(root).display().to_string(),
        message: e.to_string(),
    })?;
    let store = FactStore::create(&layout::db_path(root))?;
    let parsers = ParserManager::new();

    // Workers extract in parallel and hand buffers to the single
    // normalizer-side collector over a bounded queue.
    let (tx, rx) = channel::bounded::<(String, FileFacts, Option<(String, String)>)>(
        STAGING_QUEUE_BOUND,
    );

    let collector = std::thread::spawn(move || {
        let mut buffers = Vec::new();
        let mut failures = Vec::new();
        for (path, facts, failure) in rx {
            buffers.push((path, facts));
            if let Some(f) = failure {
                failures.push(f);
            }
        }
        (buffers, failures)
    });

    files
        .par_iter()
        .zip(relative_paths.par_iter())
        .for_each_with(tx, |tx, (file, relative)| {
            if cancel.is_cancelled() {
                return;
            }
            let (facts, failure) =
                extract_one(file, relative, root, &parsers, &frameworks);
            let _ = tx.send((relative.clone(), facts, failure));
        });

    let (buffers, mut parse_failures) = collector.join().map_err(|_| PipelineError::Io {
        path: "staging collector".to_string(),
        message: "collector thread panicked".to_string(),
    })?;
    // Worker arrival order is not deterministic; the report is.
    parse_failures.sort();

    let normalizer = Normalizer::new(config.index.effective_strict());
    let outcome = normalizer.flush(&store, buffers)?;
    store.validate()?;

    let mut receipt = outcome.receipt;
    receipt.cancelled = cancel.is_cancelled();
    receipt.write(&layout::receipt_path(root)).map_err(storage_io)?;
    let snapshot = layout::history_dir(root).join(format!("receipt-{}.json", receipt.created_at));
    receipt.write(&snapshot).map_err(storage_io)?;

    Ok(IndexOutcome {
        receipt,
        parse_failures,
        truncated: outcome.truncated,
        frameworks,
        cancelled: cancel.is_cancelled(),
    })
}

fn storage_io(e: StorageError) -> PipelineError {
    PipelineError::Storage(e)
}

/// Extract one file into its staging buffer.
fn extract_one(
    file: &crate::scanner::DiscoveredFile,
    relative: &str,
    _root: &Path,
    parsers: &ParserManager,
    frameworks: &[String],
) -> (FileFacts, Option<(String, String)>) {
    let mut facts = FileFacts::new();
    let mut failure = None;

    let content = match std::fs::read(&file.path) {
        Ok(c) => c,
        Err(e) => {
            let _ = facts.push_file_row(FactRow::File(file_row(file, "", 0, "parse_failed", &e.to_string())));
            return (facts, Some((relative.to_string(), e.to_string())));
        }
    };
    let hash = content_hash(&content) as i64;

    let info = FileInfo {
        path: file.path.clone(),
        relative_path: relative.to_string(),
        language: file.language.unwrap_or(crate::scanner::Language::JavaScript),
        framework_tags: frameworks.to_vec(),
    };

    // Manifests contribute dependency facts regardless of language.
    let name = relative.rsplit('/').next().unwrap_or(relative);
    if walker::MANIFEST_NAMES.contains(&name) {
        if let Ok(rows) = auditor_deps::manifests::extract(name, &content) {
            for row in rows {
                let _ = facts.push(row);
            }
        }
    }

    let mut parse_status = "ok";
    let mut parse_error = String::new();

    match file.language {
        Some(lang) if ParserManager::supports(lang) => {
            match parsers.parse(&content, relative, lang) {
                Ok(tree) => match extract::extract_file(&info, &content, Some(&tree)) {
                    Ok(extracted) => facts.merge(extracted),
                    Err(violation) => {
                        // Contract violations are fatal; surface through
                        // the failure channel so the run aborts loudly.
                        parse_status = "parse_failed";
                        parse_error = violation.to_string();
                        failure = Some((relative.to_string(), violation.to_string()));
                    }
                },
                Err(e) => {
                    parse_status = "parse_failed";
                    parse_error = e.to_string();
                    failure = Some((relative.to_string(), e.to_string()));
                }
            }
        }
        Some(_) => {
            // No grammar (Svelte components): path-shape extraction only.
            if let Ok(extracted) = extract::extract_file(&info, &content, None) {
                facts.merge(extracted);
            }
        }
        None => {}
    }

    let language = file.language.map(|l| l.name()).unwrap_or("");
    let _ = facts.push_file_row(FactRow::File(file_row(
        file,
        language,
        hash,
        parse_status,
        &parse_error,
    )));

    (facts, failure)
}

fn file_row(
    file: &crate::scanner::DiscoveredFile,
    language: &str,
    hash: i64,
    parse_status: &str,
    parse_error: &str,
) -> FileRow {
    FileRow {
        // Canonical path injected by the normalizer.
        path: String::new(),
        language: language.to_string(),
        content_hash: hash,
        file_size: file.file_size as i64,
        framework_tags: String::new(),
        parse_status: parse_status.to_string(),
        parse_error: parse_error.to_string(),
    }
}

/// Run analyzers against an existing store; findings are persisted and
/// returned.
pub fn run_analyze(
    root: &Path,
    cancel: &CancelToken,
) -> Result<analyzers::AnalyzerReport, PipelineError> {
    let store = FactStore::open_existing(&layout::db_path(root))?;
    let report = analyzers::run_all(&store, &analyzers::registry::builtin(), cancel);
    store.clear_outputs(auditor_core::facts::tables::TableId::Findings)?;
    store.insert_findings(&report.findings)?;
    Ok(report)
}

/// Run the taint engine against an existing store; paths are persisted
/// to the store and to `.pf/taint_analysis.json`.
pub fn run_taint(
    root: &Path,
    config: &AuditorConfig,
    cancel: &CancelToken,
) -> Result<TaintReport, PipelineError> {
    let store = FactStore::open_existing(&layout::db_path(root))?;

    let mut registry = TaintRegistry::with_defaults();
    for pack in &config.taint.rule_packs {
        let text = std::fs::read_to_string(root.join(pack)).map_err(|e| PipelineError::Io {
            path: pack.clone(),
            message: e.to_string(),
        })?;
        registry.load_toml(&text)?;
    }

    let engine = TaintEngine::new(&store, registry, config.taint.clone(), cancel.clone());
    let report = engine.run()?;

    store.clear_outputs(auditor_core::facts::tables::TableId::TaintFlows)?;
    store.insert_taint_flows(&taint_engine::to_rows(&report))?;
    let json = serde_json::to_string_pretty(&report).map_err(|e| PipelineError::Io {
        path: "taint_analysis.json".to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(layout::taint_path(root), json).map_err(|e| PipelineError::Io {
        path: layout::taint_path(root).display().to_string(),
        message: e.to_string(),
    })?;

    Ok(report)
}
