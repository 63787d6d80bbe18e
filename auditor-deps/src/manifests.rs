//! Dependency-manifest extraction into fact rows.
//!
//! Each supported manifest produces one `dep_manifests` row plus one
//! `dep_entries` row per dependency. Rows follow the extractor
//! contract: no `file` column (the normalizer injects it), `line`
//! mandatory.

use auditor_core::errors::DepsError;
use auditor_core::facts::rows::{DepEntryRow, DepManifestRow, FactRow};
use serde_json::Value;

/// Extract rows from one manifest file's content.
pub fn extract(file_name: &str, content: &[u8]) -> Result<Vec<FactRow>, DepsError> {
    let text = String::from_utf8_lossy(content);
    match file_name {
        "package.json" => package_json(&text),
        "pyproject.toml" => pyproject(&text),
        "requirements.txt" => requirements(&text),
        "Cargo.toml" => cargo_toml(&text),
        "Dockerfile" => dockerfile(&text),
        "docker-compose.yml" => compose(&text),
        other => Err(DepsError::ManifestParse {
            file: other.to_string(),
            message: "unsupported manifest".to_string(),
        }),
    }
}

fn manifest_row(pm: &str, name: &str, version: &str, build_system: &str) -> FactRow {
    FactRow::DepManifest(DepManifestRow {
        file: String::new(),
        line: 1,
        package_manager: pm.to_string(),
        name: name.to_string(),
        version: version.to_string(),
        build_system: build_system.to_string(),
    })
}

fn entry_row(pm: &str, line: u32, name: &str, spec: &str, group: &str, optional: bool) -> FactRow {
    FactRow::DepEntry(DepEntryRow {
        file: String::new(),
        line,
        package_manager: pm.to_string(),
        name: name.to_string(),
        spec: spec.to_string(),
        group_name: group.to_string(),
        is_optional: optional,
    })
}

fn package_json(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let value: Value = serde_json::from_str(text).map_err(|e| DepsError::ManifestParse {
        file: "package.json".to_string(),
        message: e.to_string(),
    })?;
    let mut rows = vec![manifest_row(
        "npm",
        value["name"].as_str().unwrap_or(""),
        value["version"].as_str().unwrap_or(""),
        "",
    )];

    for (section, group, optional) in [
        ("dependencies", "", false),
        ("devDependencies", "dev", false),
        ("optionalDependencies", "", true),
        ("peerDependencies", "peer", false),
    ] {
        if let Some(map) = value[section].as_object() {
            for (name, spec) in map {
                rows.push(entry_row(
                    "npm",
                    1,
                    name,
                    spec.as_str().unwrap_or(""),
                    group,
                    optional,
                ));
            }
        }
    }
    Ok(rows)
}

fn pyproject(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let value: toml::Value = toml::from_str(text).map_err(|e| DepsError::ManifestParse {
        file: "pyproject.toml".to_string(),
        message: e.to_string(),
    })?;

    let project = value.get("project");
    let name = project
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let version = project
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let build_system = value
        .get("build-system")
        .and_then(|b| b.get("build-backend"))
        .and_then(|v| v.as_str())
        .unwrap_or("");

    let mut rows = vec![manifest_row("pip", name, version, build_system)];

    if let Some(deps) = project
        .and_then(|p| p.get("dependencies"))
        .and_then(|v| v.as_array())
    {
        for dep in deps {
            if let Some(spec) = dep.as_str() {
                let (name, constraint) = split_requirement(spec);
                rows.push(entry_row("pip", 1, name, constraint, "", false));
            }
        }
    }
    if let Some(groups) = project
        .and_then(|p| p.get("optional-dependencies"))
        .and_then(|v| v.as_table())
    {
        for (group, deps) in groups {
            if let Some(deps) = deps.as_array() {
                for dep in deps {
                    if let Some(spec) = dep.as_str() {
                        let (name, constraint) = split_requirement(spec);
                        rows.push(entry_row("pip", 1, name, constraint, group, true));
                    }
                }
            }
        }
    }
    Ok(rows)
}

fn requirements(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let mut rows = vec![manifest_row("pip", "", "", "")];
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('-') {
            continue;
        }
        let (name, constraint) = split_requirement(trimmed);
        rows.push(entry_row("pip", i as u32 + 1, name, constraint, "", false));
    }
    Ok(rows)
}

fn cargo_toml(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let value: toml::Value = toml::from_str(text).map_err(|e| DepsError::ManifestParse {
        file: "Cargo.toml".to_string(),
        message: e.to_string(),
    })?;

    let package = value.get("package");
    let name = package
        .and_then(|p| p.get("name"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let version = package
        .and_then(|p| p.get("version"))
        .and_then(|v| v.as_str())
        .unwrap_or("");
    let mut rows = vec![manifest_row("cargo", name, version, "cargo")];

    for (section, group) in [("dependencies", ""), ("dev-dependencies", "dev")] {
        if let Some(table) = value.get(section).and_then(|v| v.as_table()) {
            for (dep_name, spec) in table {
                let constraint = match spec {
                    toml::Value::String(s) => s.clone(),
                    toml::Value::Table(t) => t
                        .get("version")
                        .and_then(|v| v.as_str())
                        .unwrap_or("")
                        .to_string(),
                    _ => String::new(),
                };
                rows.push(entry_row("cargo", 1, dep_name, &constraint, group, false));
            }
        }
    }
    Ok(rows)
}

fn dockerfile(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let mut rows = vec![manifest_row("docker", "", "", "")];
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        let Some(rest) = trimmed
            .strip_prefix("FROM ")
            .or_else(|| trimmed.strip_prefix("from "))
        else {
            continue;
        };
        // `FROM image:tag [AS stage]`
        let image_ref = rest.split_whitespace().next().unwrap_or(rest);
        let (image, tag) = match image_ref.rsplit_once(':') {
            Some((image, tag)) => (image, tag),
            None => (image_ref, "latest"),
        };
        rows.push(entry_row("docker", i as u32 + 1, image, tag, "", false));
    }
    Ok(rows)
}

fn compose(text: &str) -> Result<Vec<FactRow>, DepsError> {
    let mut rows = vec![manifest_row("docker", "", "", "")];
    for (i, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        let Some(image_ref) = trimmed.strip_prefix("image:") else {
            continue;
        };
        let image_ref = image_ref.trim().trim_matches(['"', '\'']);
        let (image, tag) = match image_ref.rsplit_once(':') {
            Some((image, tag)) => (image, tag),
            None => (image_ref, "latest"),
        };
        rows.push(entry_row("docker", i as u32 + 1, image, tag, "", false));
    }
    Ok(rows)
}

/// Split `requests>=2.28,<3` into name and constraint.
fn split_requirement(spec: &str) -> (&str, &str) {
    let split_at = spec
        .find(|c: char| ['=', '<', '>', '~', '!', '[', ';', ' '].contains(&c))
        .unwrap_or(spec.len());
    (spec[..split_at].trim(), spec[split_at..].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor_core::facts::tables::TableId;

    #[test]
    fn dockerfile_from_lines() {
        let rows = extract("Dockerfile", b"FROM postgres:17-alpine3.21\nRUN true\n").unwrap();
        let entries: Vec<_> = rows
            .iter()
            .filter(|r| r.table() == TableId::DepEntries)
            .collect();
        assert_eq!(entries.len(), 1);
        if let FactRow::DepEntry(e) = entries[0] {
            assert_eq!(e.name, "postgres");
            assert_eq!(e.spec, "17-alpine3.21");
            assert_eq!(e.line, 1);
        }
    }

    #[test]
    fn requirements_lines_and_constraints() {
        let rows = extract("requirements.txt", b"# comment\nrequests>=2.28\nflask\n").unwrap();
        let entries: Vec<_> = rows
            .iter()
            .filter_map(|r| match r {
                FactRow::DepEntry(e) => Some(e),
                _ => None,
            })
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "requests");
        assert_eq!(entries[0].spec, ">=2.28");
        assert_eq!(entries[0].line, 2);
    }

    #[test]
    fn package_json_groups() {
        let rows = extract(
            "package.json",
            br#"{"name":"app","version":"1.0.0","dependencies":{"express":"^4"},"devDependencies":{"vitest":"^2"}}"#,
        )
        .unwrap();
        let entries: Vec<_> = rows
            .iter()
            .filter_map(|r| match r {
                FactRow::DepEntry(e) => Some(e),
                _ => None,
            })
            .collect();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|e| e.name == "vitest" && e.group_name == "dev"));
    }
}
