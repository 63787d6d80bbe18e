//! Dependency pipeline tests: manifest rows feeding the upgrade policy,
//! no network involved.

use auditor_core::facts::rows::FactRow;
use auditor_deps::manifests;
use auditor_deps::upgrade::{select_container_upgrade, select_upgrade, UpgradePolicy};

fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// A Dockerfile's pinned tag runs through the container upgrade policy:
/// no downgrade, no pre-release, variant family preserved.
#[test]
fn dockerfile_tag_upgrade_end_to_end() {
    let rows = manifests::extract("Dockerfile", b"FROM postgres:17-alpine3.21\n").unwrap();
    let entry = rows
        .iter()
        .find_map(|r| match r {
            FactRow::DepEntry(e) => Some(e),
            _ => None,
        })
        .unwrap();
    assert_eq!(entry.name, "postgres");
    assert_eq!(entry.spec, "17-alpine3.21");

    let registry_tags = strings(&[
        "17-alpine3.21",
        "18-alpine3.22",
        "15.15-trixie",
        "18-rc1-bookworm",
    ]);
    let proposal =
        select_container_upgrade(&entry.spec, &registry_tags, UpgradePolicy::default());
    assert_eq!(proposal.as_deref(), Some("18-alpine3.22"));
}

/// Pre-release package versions are rejected by default and accepted
/// only with the opt-in.
#[test]
fn prerelease_policy_on_package_versions() {
    let released = strings(&["1.0.0", "1.1.0a1", "1.0.1"]);

    let default = select_upgrade("1.0.0", &released, UpgradePolicy::default());
    assert_eq!(default.as_deref(), Some("1.0.1"));

    let permissive = select_upgrade(
        "1.0.0",
        &released,
        UpgradePolicy { allow_prerelease: true },
    );
    assert_eq!(permissive.as_deref(), Some("1.1.0a1"));
}

/// pyproject optional groups are kept distinct from the main group.
#[test]
fn pyproject_optional_groups() {
    let rows = manifests::extract(
        "pyproject.toml",
        br#"
[project]
name = "svc"
version = "0.3.0"
dependencies = ["flask>=3.0", "sqlalchemy>=2.0"]

[project.optional-dependencies]
test = ["pytest>=8"]

[build-system]
build-backend = "hatchling.build"
"#,
    )
    .unwrap();

    let entries: Vec<_> = rows
        .iter()
        .filter_map(|r| match r {
            FactRow::DepEntry(e) => Some(e),
            _ => None,
        })
        .collect();
    assert_eq!(entries.len(), 3);
    let pytest = entries.iter().find(|e| e.name == "pytest").unwrap();
    assert!(pytest.is_optional);
    assert_eq!(pytest.group_name, "test");

    let manifest = rows
        .iter()
        .find_map(|r| match r {
            FactRow::DepManifest(m) => Some(m),
            _ => None,
        })
        .unwrap();
    assert_eq!(manifest.name, "svc");
    assert_eq!(manifest.build_system, "hatchling.build");
}

/// Compose image lines decompose like Dockerfile FROM lines.
#[test]
fn compose_images() {
    let rows = manifests::extract(
        "docker-compose.yml",
        b"services:\n  db:\n    image: postgres:17-alpine3.21\n  cache:\n    image: \"redis:7.4-bookworm\"\n",
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
    assert!(entries.iter().any(|e| e.name == "postgres" && e.spec == "17-alpine3.21"));
    assert!(entries.iter().any(|e| e.name == "redis" && e.spec == "7.4-bookworm"));
}
