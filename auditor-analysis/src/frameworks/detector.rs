//! Heuristic framework classifier.
//!
//! A pure function of the file tree and manifests: no state machine.
//! Where a framework has several independent signals (conventional
//! directory, config file, manifest entry), at least two must agree.
//! Output is advisory — extractors gate expensive sub-passes on it, but
//! a direct in-file signal (import, decorator) always overrides a
//! missing detection.

use std::path::Path;

use auditor_core::types::collections::FxHashSet;

/// One signature: framework name plus its three signal classes.
#[derive(Debug, Clone)]
pub struct FrameworkSignal {
    pub name: &'static str,
    /// Conventional directories, project-relative.
    pub directories: &'static [&'static str],
    /// Config files at any depth.
    pub config_files: &'static [&'static str],
    /// Substrings matched against manifest dependency text.
    pub manifest_markers: &'static [&'static str],
}

const SIGNATURES: &[FrameworkSignal] = &[
    FrameworkSignal {
        name: "sveltekit",
        directories: &["src/routes"],
        config_files: &["svelte.config.js", "svelte.config.ts"],
        manifest_markers: &["@sveltejs/kit"],
    },
    FrameworkSignal {
        name: "express",
        directories: &["routes", "src/routes"],
        config_files: &[],
        manifest_markers: &["\"express\""],
    },
    FrameworkSignal {
        name: "sqlalchemy",
        directories: &["models", "migrations"],
        config_files: &["alembic.ini"],
        manifest_markers: &["sqlalchemy", "SQLAlchemy"],
    },
    FrameworkSignal {
        name: "celery",
        directories: &["tasks"],
        config_files: &["celeryconfig.py", "celery.py"],
        manifest_markers: &["celery"],
    },
    FrameworkSignal {
        name: "pytest",
        directories: &["tests"],
        config_files: &["pytest.ini", "conftest.py"],
        manifest_markers: &["pytest"],
    },
    FrameworkSignal {
        name: "fastapi",
        directories: &["app/routers", "routers"],
        config_files: &[],
        manifest_markers: &["fastapi"],
    },
    FrameworkSignal {
        name: "pydantic",
        directories: &["schemas"],
        config_files: &[],
        manifest_markers: &["pydantic"],
    },
    FrameworkSignal {
        name: "wtforms",
        directories: &["forms"],
        config_files: &[],
        manifest_markers: &["wtforms", "flask-wtf", "Flask-WTF"],
    },
];

/// Detect framework tags for a project.
///
/// `relative_paths` are forward-slash project-relative file paths;
/// `manifest_text` is the concatenated content of discovered manifests.
pub fn detect_frameworks(relative_paths: &[String], manifest_text: &str) -> Vec<String> {
    let dirs: FxHashSet<&str> = relative_paths
        .iter()
        .filter_map(|p| p.rsplit_once('/').map(|(d, _)| d))
        .collect();
    let file_names: FxHashSet<&str> = relative_paths
        .iter()
        .map(|p| p.rsplit('/').next().unwrap_or(p))
        .collect();

    let mut detected = Vec::new();
    for sig in SIGNATURES {
        let mut signals = 0;
        let mut available = 0;

        if !sig.directories.is_empty() {
            available += 1;
            let hit = sig
                .directories
                .iter()
                .any(|d| dirs.iter().any(|seen| *seen == *d || seen.starts_with(&format!("{d}/"))));
            if hit {
                signals += 1;
            }
        }
        if !sig.config_files.is_empty() {
            available += 1;
            if sig.config_files.iter().any(|c| file_names.contains(c)) {
                signals += 1;
            }
        }
        if !sig.manifest_markers.is_empty() {
            available += 1;
            if sig.manifest_markers.iter().any(|m| manifest_text.contains(m)) {
                signals += 1;
            }
        }

        // Two-of-three where three exist; a single signal suffices only
        // when the signature has a single signal class.
        let needed = if available >= 2 { 2 } else { 1 };
        if signals >= needed {
            detected.push(sig.name.to_string());
        }
    }

    detected.sort();
    detected
}

/// Read every known manifest under `root` into one text blob for marker
/// matching. Missing files are fine.
pub fn read_manifest_text(root: &Path) -> String {
    let mut text = String::new();
    for name in ["package.json", "pyproject.toml", "requirements.txt", "Cargo.toml"] {
        if let Ok(content) = std::fs::read_to_string(root.join(name)) {
            text.push_str(&content);
            text.push('\n');
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_of_three_required() {
        // Only the directory signal: not enough for sveltekit.
        let paths = vec!["src/routes/+page.svelte".to_string()];
        let detected = detect_frameworks(&paths, "");
        assert!(!detected.contains(&"sveltekit".to_string()));

        // Directory + manifest: detected.
        let detected = detect_frameworks(&paths, "\"@sveltejs/kit\": \"^2\"");
        assert!(detected.contains(&"sveltekit".to_string()));
    }

    #[test]
    fn manifest_only_insufficient_for_multi_signal_frameworks() {
        let detected = detect_frameworks(&[], "sqlalchemy==2.0");
        assert!(!detected.contains(&"sqlalchemy".to_string()));
    }

    #[test]
    fn output_is_sorted_and_deterministic() {
        let paths = vec![
            "tests/test_app.py".to_string(),
            "conftest.py".to_string(),
        ];
        let a = detect_frameworks(&paths, "pytest\nsqlalchemy");
        let b = detect_frameworks(&paths, "pytest\nsqlalchemy");
        assert_eq!(a, b);
    }
}
