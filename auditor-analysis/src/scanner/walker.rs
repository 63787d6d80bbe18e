//! Parallel file walker using the `ignore` crate's `WalkParallel`.
//!
//! Supports `.pfignore` (gitignore syntax, hierarchical) and the default
//! ignore patterns below.

use std::path::Path;

use auditor_core::cancel::CancelToken;
use auditor_core::config::IndexConfig;
use auditor_core::errors::ScanError;
use crossbeam_channel as channel;

use super::language_detect::Language;
use super::types::DiscoveredFile;

/// Default ignore patterns applied to every scan.
pub const DEFAULT_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    ".pf",
    "dist",
    "build",
    "target",
    ".next",
    ".svelte-kit",
    "__pycache__",
    ".pytest_cache",
    "coverage",
    ".nyc_output",
    "vendor",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
];

/// Manifest file names indexed regardless of language detection.
pub const MANIFEST_NAMES: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Cargo.toml",
    "Dockerfile",
    "docker-compose.yml",
];

/// Walk a directory tree in parallel, collecting discovered files.
///
/// Respects `.gitignore`, `.pfignore`, and the default ignore patterns.
/// Returns files sorted by path for deterministic output.
pub fn walk_directory(
    root: &Path,
    config: &IndexConfig,
    cancel: &CancelToken,
) -> Result<Vec<DiscoveredFile>, ScanError> {
    if !root.exists() {
        return Err(ScanError::RootMissing {
            path: root.display().to_string(),
        });
    }

    let (tx, rx) = channel::unbounded();

    let max_file_size = config.effective_max_file_size();
    let follow_links = config.follow_symlinks.unwrap_or(false);
    let threads = config.effective_threads();

    let mut builder = ignore::WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .add_custom_ignore_filename(".pfignore")
        .max_filesize(Some(max_file_size))
        .follow_links(follow_links);

    if threads > 0 {
        builder.threads(threads);
    }

    // Overrides: positive patterns whitelist, negated patterns blacklist.
    let mut overrides = ignore::overrides::OverrideBuilder::new(root);
    if !config.include.is_empty() {
        for pattern in &config.include {
            let _ = overrides.add(pattern);
        }
    }
    for pattern in DEFAULT_IGNORES {
        let _ = overrides.add(&format!("!{}/**", pattern));
        let _ = overrides.add(&format!("!{}", pattern));
    }
    for pattern in &config.extra_ignore {
        let _ = overrides.add(&format!("!{}", pattern));
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let walker = builder.build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        let cancel = cancel.clone();
        Box::new(move |entry| {
            if cancel.is_cancelled() {
                return ignore::WalkState::Quit;
            }

            let entry = match entry {
                Ok(e) => e,
                Err(_) => return ignore::WalkState::Continue,
            };

            match entry.file_type() {
                Some(ft) if ft.is_file() => {}
                _ => return ignore::WalkState::Continue,
            }

            let path = entry.path().to_path_buf();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => return ignore::WalkState::Continue,
            };

            let language =
                Language::from_extension(path.extension().and_then(|e| e.to_str()));
            let is_manifest = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| MANIFEST_NAMES.contains(&n))
                .unwrap_or(false);

            if language.is_none() && !is_manifest {
                return ignore::WalkState::Continue;
            }

            let _ = tx.send(DiscoveredFile {
                path,
                file_size: metadata.len(),
                language,
            });

            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<DiscoveredFile> = rx.into_iter().collect();
    // Sort for deterministic output
    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}
