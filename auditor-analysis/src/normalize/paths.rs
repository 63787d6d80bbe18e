//! Canonical path handling.
//!
//! Every stored path is project-relative with forward slashes,
//! regardless of host OS. The normalizer is the only component that
//! produces these.

use std::path::Path;

/// Canonicalize an absolute path against the project root.
///
/// Falls back to the full path (slash-normalized) when the file is not
/// under the root — that can only happen with symlinked trees.
pub fn canonical_relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in rel.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_with_forward_slashes() {
        let root = PathBuf::from("/work/project");
        let file = PathBuf::from("/work/project/src/app.py");
        assert_eq!(canonical_relative(&root, &file), "src/app.py");
    }
}
