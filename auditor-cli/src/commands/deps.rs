//! `aud deps` — inspect dependency manifests, optionally checking
//! registries for newer versions.
//!
//! Works directly off the manifests on disk; no index required.
//! Registry failures are warnings: the current version is kept.

use std::path::Path;

use auditor_core::config::AuditorConfig;
use auditor_core::facts::rows::FactRow;
use auditor_deps::registry::RegistryClient;
use auditor_deps::{manifests, select_upgrade, upgrade, UpgradePolicy};

use crate::exit;

const MANIFEST_NAMES: &[&str] = &[
    "package.json",
    "pyproject.toml",
    "requirements.txt",
    "Cargo.toml",
    "Dockerfile",
    "docker-compose.yml",
];

pub fn run(root: &Path, check_latest: bool, allow_prerelease: bool, upgrade_all: bool) -> i32 {
    let config = match AuditorConfig::load(root) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: bad .pf/config.toml: {e}");
            return exit::USER_ERROR;
        }
    };

    let mut entries = Vec::new();
    for name in MANIFEST_NAMES {
        let path = root.join(name);
        let Ok(content) = std::fs::read(&path) else { continue };
        match manifests::extract(name, &content) {
            Ok(rows) => {
                for row in rows {
                    if let FactRow::DepEntry(entry) = row {
                        entries.push(entry);
                    }
                }
            }
            Err(e) => eprintln!("warning: {e}"),
        }
    }

    if entries.is_empty() {
        println!("no dependency manifests found");
        return exit::SUCCESS;
    }

    let policy = UpgradePolicy {
        allow_prerelease: allow_prerelease || config.deps.effective_allow_prerelease(),
    };
    let client = if check_latest || upgrade_all {
        Some(RegistryClient::new(config.deps.effective_timeout_secs()))
    } else {
        None
    };

    for entry in &entries {
        print!("{} {} {}", entry.package_manager, entry.name, entry.spec);
        if let Some(client) = &client {
            match latest_for(client, entry, policy) {
                Ok(Some(candidate)) => print!("  ->  {candidate}"),
                Ok(None) => print!("  (current kept)"),
                Err(e) => {
                    // External failure: keep the current version.
                    print!("  (registry unavailable)");
                    eprintln!("warning: {e}");
                }
            }
        }
        println!();
    }
    exit::SUCCESS
}

fn latest_for(
    client: &RegistryClient,
    entry: &auditor_core::facts::rows::DepEntryRow,
    policy: UpgradePolicy,
) -> Result<Option<String>, auditor_core::errors::DepsError> {
    match entry.package_manager.as_str() {
        "pip" => {
            let versions = client.pypi_versions(&entry.name)?;
            Ok(select_upgrade(current_of(&entry.spec), &versions, policy))
        }
        "npm" => {
            let versions = client.npm_versions(&entry.name)?;
            Ok(select_upgrade(current_of(&entry.spec), &versions, policy))
        }
        "cargo" => {
            let versions = client.crates_versions(&entry.name)?;
            Ok(select_upgrade(current_of(&entry.spec), &versions, policy))
        }
        "docker" => {
            let tags = client.docker_tags(&entry.name, 5)?;
            Ok(upgrade::select_container_upgrade(&entry.spec, &tags, policy))
        }
        _ => Ok(None),
    }
}

/// Strip the constraint operator off a spec to get the anchored version.
fn current_of(spec: &str) -> &str {
    spec.trim_start_matches(['=', '<', '>', '~', '^', '!', ' '])
        .split(',')
        .next()
        .unwrap_or(spec)
        .trim()
}
