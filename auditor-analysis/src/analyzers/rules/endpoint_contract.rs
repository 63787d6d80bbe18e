//! Frontend fetch calls matched against backend endpoints.
//!
//! Form-action endpoints never participate: their URLs (`/x?/action`)
//! are browser form targets, not fetchable API routes. The matcher
//! filters on `endpoint_kind` accordingly.

use auditor_core::errors::AnalysisError;
use auditor_core::facts::rows::FindingRow;
use auditor_core::traits::storage::IFactReader;

use crate::analyzers::Analyzer;
use crate::extract::sveltekit::{KIND_HTTP, KIND_PAGE};

const RULE_ID: &str = "endpoint-unmatched-fetch";

pub struct EndpointContract;

impl Analyzer for EndpointContract {
    fn id(&self) -> &'static str {
        "endpoint_contract"
    }

    fn run(&self, store: &dyn IFactReader) -> Result<Vec<FindingRow>, AnalysisError> {
        // Matchable endpoints: HTTP handlers and pages, never form actions.
        let mut endpoints = store.endpoints(Some(KIND_HTTP))?;
        endpoints.extend(store.endpoints(Some(KIND_PAGE))?);

        let mut findings = Vec::new();
        for call in store.calls_to("fetch")? {
            let args = store.call_args_at(&call.file, call.line, &call.callee_name)?;
            let Some(url_arg) = args.first() else { continue };
            let url = url_arg.expression.trim_matches(['"', '\'', '`']);
            if !url.starts_with('/') {
                continue;
            }
            let path = url.split('?').next().unwrap_or(url);

            if !endpoints.iter().any(|e| pattern_matches(&e.pattern, path)) {
                findings.push(FindingRow {
                    file: call.file.clone(),
                    line: call.line,
                    rule_id: RULE_ID.to_string(),
                    severity: "medium".to_string(),
                    message: format!("fetch of `{}` matches no known endpoint", path),
                    evidence: url_arg.expression.clone(),
                    analyzer: "endpoint_contract".to_string(),
                });
            }
        }
        Ok(findings)
    }
}

/// Match a concrete path against an express-style pattern.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
    let path_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let mut pi = 0;
    for (i, seg) in pattern_segments.iter().enumerate() {
        if seg.starts_with(':') && seg.ends_with('*') {
            // Rest parameter swallows the remainder.
            return true;
        }
        if seg.starts_with(':') && seg.ends_with('?') {
            // Optional parameter: may or may not consume a segment.
            let remaining_pattern = &pattern_segments[i + 1..];
            let with = path_segments.len() >= pi + 1
                && match_tail(remaining_pattern, &path_segments[pi + 1..]);
            let without = match_tail(remaining_pattern, &path_segments[pi..]);
            return with || without;
        }
        match path_segments.get(pi) {
            Some(p) if seg.starts_with(':') || p == seg => pi += 1,
            _ => return false,
        }
    }
    pi == path_segments.len()
}

fn match_tail(pattern: &[&str], path: &[&str]) -> bool {
    let mut pi = 0;
    for (i, seg) in pattern.iter().enumerate() {
        if seg.starts_with(':') && seg.ends_with('*') {
            return true;
        }
        if seg.starts_with(':') && seg.ends_with('?') {
            let rest = &pattern[i + 1..];
            let with = path.len() >= pi + 1 && match_tail(rest, &path[pi + 1..]);
            let without = match_tail(rest, &path[pi..]);
            return with || without;
        }
        match path.get(pi) {
            Some(p) if seg.starts_with(':') || *p == *seg => pi += 1,
            _ => return false,
        }
    }
    pi == path.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_and_param_matching() {
        assert!(pattern_matches("/account", "/account"));
        assert!(pattern_matches("/blog/:slug", "/blog/hello"));
        assert!(!pattern_matches("/blog/:slug", "/blog"));
        assert!(!pattern_matches("/account", "/accounts"));
    }

    #[test]
    fn optional_and_rest_matching() {
        assert!(pattern_matches("/:id?/:rest*", "/"));
        assert!(pattern_matches("/:id?/:rest*", "/abc"));
        assert!(pattern_matches("/:id?/:rest*", "/abc/x/y"));
        assert!(pattern_matches("/files/:path*", "/files/a/b/c"));
    }
}
