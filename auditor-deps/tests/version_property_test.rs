//! Property tests for version parsing and ordering.

use std::cmp::Ordering;

use auditor_deps::version::ParsedVersion;
use proptest::prelude::*;

proptest! {
    /// Parsing never panics on arbitrary tag-shaped input.
    #[test]
    fn parse_never_panics(tag in "[a-z0-9.\\-]{0,24}") {
        let _ = ParsedVersion::parse(&tag);
        let _ = ParsedVersion::parse_container_tag(&tag);
    }

    /// Numeric tuples order like numbers, never like strings.
    #[test]
    fn tuple_ordering_is_numeric(a in 0u64..2000, b in 0u64..2000, patch in 0u64..50) {
        let va = ParsedVersion::parse(&format!("{a}.0.{patch}")).unwrap();
        let vb = ParsedVersion::parse(&format!("{b}.0.{patch}")).unwrap();
        prop_assert_eq!(va.cmp_semantic(&vb), a.cmp(&b));
    }

    /// Ordering is antisymmetric.
    #[test]
    fn ordering_antisymmetric(
        a in 0u64..100, b in 0u64..100, c in 0u64..100,
        x in 0u64..100, y in 0u64..100, z in 0u64..100,
    ) {
        let va = ParsedVersion::parse(&format!("{a}.{b}.{c}")).unwrap();
        let vb = ParsedVersion::parse(&format!("{x}.{y}.{z}")).unwrap();
        match va.cmp_semantic(&vb) {
            Ordering::Less => prop_assert_eq!(vb.cmp_semantic(&va), Ordering::Greater),
            Ordering::Greater => prop_assert_eq!(vb.cmp_semantic(&va), Ordering::Less),
            Ordering::Equal => prop_assert_eq!(vb.cmp_semantic(&va), Ordering::Equal),
        }
    }

    /// A stable version always outranks any pre-release of itself.
    #[test]
    fn stable_beats_own_prerelease(major in 1u64..50, n in 1u32..9) {
        let stable = ParsedVersion::parse(&format!("{major}.0.0")).unwrap();
        let pre = ParsedVersion::parse(&format!("{major}.0.0a{n}")).unwrap();
        prop_assert_eq!(stable.cmp_semantic(&pre), Ordering::Greater);
    }
}
