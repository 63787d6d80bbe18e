//! Append-only documentation capsule layout:
//! `docs/{ecosystem}/{package}@{version}/{file}.md` plus `meta.json`.
//!
//! Full pages live side by side; nothing is summarized away.

use std::path::{Path, PathBuf};

use auditor_core::errors::DocsError;
use serde::{Deserialize, Serialize};

/// Capsule manifest, one per package@version.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocsMeta {
    pub package: String,
    pub version: String,
    pub ecosystem: String,
    /// Every URL a page was fetched from; at least one.
    pub source_urls: Vec<String>,
    /// Seconds since the epoch.
    pub fetched_at: u64,
    /// Markdown files in the capsule, each listed here.
    pub files: Vec<String>,
}

impl DocsMeta {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// `docs_root/{ecosystem}/{package}@{version}/`.
pub fn capsule_dir(docs_root: &Path, ecosystem: &str, package: &str, version: &str) -> PathBuf {
    docs_root
        .join(ecosystem)
        .join(format!("{package}@{version}"))
}

/// Write one markdown page into the capsule.
pub fn write_page(dir: &Path, file_stem: &str, markdown: &str) -> Result<String, DocsError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let file_name = format!("{}.md", sanitize(file_stem));
    let path = dir.join(&file_name);
    std::fs::write(&path, markdown).map_err(|e| io_err(&path, e))?;
    Ok(file_name)
}

/// Write the manifest. Every markdown file must be listed.
pub fn write_meta(dir: &Path, meta: &DocsMeta) -> Result<(), DocsError> {
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    let path = dir.join("meta.json");
    let json = serde_json::to_string_pretty(meta).map_err(|e| DocsError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    std::fs::write(&path, json).map_err(|e| io_err(&path, e))
}

pub fn load_meta(dir: &Path) -> Result<DocsMeta, DocsError> {
    let path = dir.join("meta.json");
    let text = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&text).map_err(|e| DocsError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// List capsules under the docs root as `(ecosystem, package@version)`.
pub fn list_capsules(docs_root: &Path) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Ok(ecosystems) = std::fs::read_dir(docs_root) else {
        return out;
    };
    for eco in ecosystems.flatten() {
        let eco_name = eco.file_name().to_string_lossy().to_string();
        let Ok(capsules) = std::fs::read_dir(eco.path()) else { continue };
        for capsule in capsules.flatten() {
            out.push((eco_name.clone(), capsule.file_name().to_string_lossy().to_string()));
        }
    }
    out.sort();
    out
}

fn sanitize(stem: &str) -> String {
    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "page".to_string()
    } else {
        cleaned
    }
}

fn io_err(path: &Path, e: std::io::Error) -> DocsError {
    DocsError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capsule_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = capsule_dir(tmp.path(), "py", "flask", "3.0.0");
        let file = write_page(&dir, "README", "# Flask").unwrap();
        let meta = DocsMeta {
            package: "flask".into(),
            version: "3.0.0".into(),
            ecosystem: "py".into(),
            source_urls: vec!["https://flask.palletsprojects.com".into()],
            fetched_at: 0,
            files: vec![file],
        };
        write_meta(&dir, &meta).unwrap();

        let loaded = load_meta(&dir).unwrap();
        assert_eq!(loaded.file_count(), 1);
        assert!(!loaded.source_urls.is_empty());
        assert_eq!(
            list_capsules(tmp.path()),
            vec![("py".to_string(), "flask@3.0.0".to_string())]
        );
    }
}
