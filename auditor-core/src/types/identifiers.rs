//! Stable identifiers.
//!
//! Symbol ids must be deterministic across runs on an unchanged tree:
//! a pure function of the canonical location and qualified name.

use xxhash_rust::xxh3::xxh3_64;

/// Compute the stable identifier for a symbol.
///
/// The id is `xxh3(canonical_path \x00 kind \x00 qualified_name \x00 start_line)`.
/// Any change to the set of inputs is a schema-contract change.
pub fn symbol_id(canonical_path: &str, kind: &str, qualified_name: &str, start_line: u32) -> i64 {
    let mut buf = Vec::with_capacity(
        canonical_path.len() + kind.len() + qualified_name.len() + 16,
    );
    buf.extend_from_slice(canonical_path.as_bytes());
    buf.push(0);
    buf.extend_from_slice(kind.as_bytes());
    buf.push(0);
    buf.extend_from_slice(qualified_name.as_bytes());
    buf.push(0);
    buf.extend_from_slice(&start_line.to_le_bytes());
    xxh3_64(&buf) as i64
}

/// Content hash for file identity (xxh3 over raw bytes).
pub fn content_hash(content: &[u8]) -> u64 {
    xxh3_64(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_id_is_stable() {
        let a = symbol_id("src/app.py", "function", "app.handler", 10);
        let b = symbol_id("src/app.py", "function", "app.handler", 10);
        assert_eq!(a, b);
    }

    #[test]
    fn symbol_id_distinguishes_line() {
        let a = symbol_id("src/app.py", "function", "app.handler", 10);
        let b = symbol_id("src/app.py", "function", "app.handler", 11);
        assert_ne!(a, b);
    }

    #[test]
    fn symbol_id_no_field_concatenation_collision() {
        // "ab" + "c" must not collide with "a" + "bc".
        let a = symbol_id("f", "ab", "c", 1);
        let b = symbol_id("f", "a", "bc", 1);
        assert_ne!(a, b);
    }
}
