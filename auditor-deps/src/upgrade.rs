//! Upgrade selection policy.
//!
//! Defaults: never downgrade, never propose a pre-release, and keep a
//! container image on its current OS-base family. `allow_prerelease`
//! opts in to pre-release candidates; nothing opts out of the other
//! two.

use std::cmp::Ordering;

use crate::version::{ParsedVersion, Stability};

/// Caller-controlled knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradePolicy {
    pub allow_prerelease: bool,
}

/// Pick the best upgrade for a plain package version.
///
/// Returns None when no candidate improves on `current`.
pub fn select_upgrade(
    current: &str,
    candidates: &[String],
    policy: UpgradePolicy,
) -> Option<String> {
    let current_parsed = ParsedVersion::parse(current)?;
    best(
        &current_parsed,
        candidates.iter().filter_map(|c| {
            ParsedVersion::parse(c).map(|parsed| (c.clone(), parsed))
        }),
        policy,
    )
}

/// Pick the best upgrade for a container tag, preserving the variant's
/// base family.
pub fn select_container_upgrade(
    current: &str,
    tags: &[String],
    policy: UpgradePolicy,
) -> Option<String> {
    let current_parsed = ParsedVersion::parse_container_tag(current)?;
    let family = current_parsed.variant_family();
    best(
        &current_parsed,
        tags.iter().filter_map(|tag| {
            let parsed = ParsedVersion::parse_container_tag(tag)?;
            if !family.compatible(&parsed.variant_family()) {
                return None;
            }
            Some((tag.clone(), parsed))
        }),
        policy,
    )
}

fn best(
    current: &ParsedVersion,
    candidates: impl Iterator<Item = (String, ParsedVersion)>,
    policy: UpgradePolicy,
) -> Option<String> {
    let mut best: Option<(String, ParsedVersion)> = None;
    for (raw, parsed) in candidates {
        if parsed.stability == Stability::PreRelease && !policy.allow_prerelease {
            continue;
        }
        if parsed.cmp_semantic(current) != Ordering::Greater {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, incumbent)) => parsed.cmp_semantic(incumbent) == Ordering::Greater,
        };
        if better {
            best = Some((raw, parsed));
        }
    }
    best.map(|(raw, _)| raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn container_upgrade_never_downgrades() {
        let result = select_container_upgrade(
            "17-alpine3.21",
            &tags(&["17-alpine3.21", "18-alpine3.22", "15.15-trixie", "18-rc1-bookworm"]),
            UpgradePolicy::default(),
        );
        assert_eq!(result.as_deref(), Some("18-alpine3.22"));
    }

    #[test]
    fn prerelease_rejected_by_default() {
        let result = select_upgrade(
            "1.0.0",
            &tags(&["1.0.0", "1.1.0a1", "1.0.1"]),
            UpgradePolicy::default(),
        );
        assert_eq!(result.as_deref(), Some("1.0.1"));

        let result = select_upgrade(
            "1.0.0",
            &tags(&["1.0.0", "1.1.0a1", "1.0.1"]),
            UpgradePolicy { allow_prerelease: true },
        );
        assert_eq!(result.as_deref(), Some("1.1.0a1"));
    }

    #[test]
    fn no_candidate_keeps_current() {
        let result = select_upgrade(
            "2.0.0",
            &tags(&["1.9.0", "2.0.0"]),
            UpgradePolicy::default(),
        );
        assert_eq!(result, None);
    }

    #[test]
    fn meta_tags_never_proposed() {
        let result = select_container_upgrade(
            "17-alpine3.21",
            &tags(&["latest", "alpine", "18-alpine3.22"]),
            UpgradePolicy::default(),
        );
        assert_eq!(result.as_deref(), Some("18-alpine3.22"));
    }
}
