//! Source/sink pattern registry, TOML-extensible.
//!
//! Patterns match call shapes as `receiver.callee`, bare `callee`, or a
//! substring of an assignment's rhs expression. Built-in defaults cover
//! the common web/CLI surface; rule packs add project-specific entries.

use aho_corasick::AhoCorasick;
use auditor_core::errors::TaintError;
use serde::Deserialize;

/// One source pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceRule {
    /// Substring matched against an assignment rhs (e.g. "request.args").
    pub pattern: String,
    /// Source kind recorded on emitted paths.
    pub kind: String,
}

/// One sink pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkRule {
    /// `receiver.callee`, or bare callee name.
    pub pattern: String,
    pub kind: String,
}

#[derive(Debug, Deserialize)]
struct RulePack {
    #[serde(default)]
    sources: Vec<SourceRule>,
    #[serde(default)]
    sinks: Vec<SinkRule>,
}

/// The loaded rule set.
///
/// Source patterns are substring rules compiled into one Aho-Corasick
/// automaton; an assignment rhs is scanned once regardless of rule
/// count.
#[derive(Debug, Default, Clone)]
pub struct TaintRegistry {
    sources: Vec<SourceRule>,
    sinks: Vec<SinkRule>,
    source_matcher: Option<AhoCorasick>,
}

impl TaintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in rules for the supported frameworks.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for (pattern, kind) in [
            // Python web
            ("request.args", "user_input"),
            ("request.form", "user_input"),
            ("request.json", "user_input"),
            ("request.GET", "user_input"),
            ("request.POST", "user_input"),
            ("request.query_params", "user_input"),
            // JS web
            ("req.query", "user_input"),
            ("req.body", "user_input"),
            ("req.params", "user_input"),
            ("url.searchParams", "user_input"),
            // Environment and files
            ("os.environ", "environment"),
            ("os.getenv", "environment"),
            ("process.env", "environment"),
            (".read()", "file"),
            ("readFileSync", "file"),
            // Deserialized blobs
            ("json.loads", "deserialized"),
            ("pickle.loads", "deserialized"),
            ("yaml.load", "deserialized"),
            ("JSON.parse", "deserialized"),
        ] {
            registry.sources.push(SourceRule {
                pattern: pattern.to_string(),
                kind: kind.to_string(),
            });
        }

        registry.rebuild_matcher();

        for (pattern, kind) in [
            ("cursor.execute", "sql"),
            ("db.execute", "sql"),
            ("db.query", "sql"),
            ("connection.execute", "sql"),
            ("session.execute", "sql"),
            ("os.system", "command"),
            ("subprocess.run", "command"),
            ("subprocess.Popen", "command"),
            ("subprocess.call", "command"),
            ("child_process.exec", "command"),
            ("exec", "command"),
            ("eval", "code_eval"),
            ("render_template_string", "template"),
            ("res.send", "network_write"),
            ("res.write", "network_write"),
        ] {
            registry.sinks.push(SinkRule {
                pattern: pattern.to_string(),
                kind: kind.to_string(),
            });
        }
        registry
    }

    /// Merge a TOML rule pack:
    ///
    /// ```toml
    /// [[sources]]
    /// pattern = "custom_input"
    /// kind = "user_input"
    ///
    /// [[sinks]]
    /// pattern = "dangerous_call"
    /// kind = "command"
    /// ```
    pub fn load_toml(&mut self, text: &str) -> Result<(), TaintError> {
        let pack: RulePack = toml::from_str(text).map_err(|e| TaintError::Storage(
            auditor_core::errors::StorageError::NotSupported {
                operation: "taint rule pack".to_string(),
                reason: e.to_string(),
            },
        ))?;
        self.sources.extend(pack.sources);
        self.sinks.extend(pack.sinks);
        self.rebuild_matcher();
        Ok(())
    }

    fn rebuild_matcher(&mut self) {
        let patterns: Vec<&str> = self.sources.iter().map(|r| r.pattern.as_str()).collect();
        self.source_matcher = AhoCorasick::new(&patterns).ok();
    }

    /// Match an assignment rhs against source patterns.
    pub fn match_source(&self, expression: &str) -> Option<&SourceRule> {
        let matcher = self.source_matcher.as_ref()?;
        let hit = matcher.find(expression)?;
        self.sources.get(hit.pattern().as_usize())
    }

    /// Match a call shape against sink patterns.
    pub fn match_sink(&self, receiver: &str, callee: &str) -> Option<&SinkRule> {
        let qualified = if receiver.is_empty() {
            callee.to_string()
        } else {
            format!("{receiver}.{callee}")
        };
        self.sinks
            .iter()
            .find(|r| r.pattern == qualified || r.pattern == callee)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_common_shapes() {
        let registry = TaintRegistry::with_defaults();
        assert!(registry.match_source("request.args.get('q')").is_some());
        assert!(registry.match_sink("cursor", "execute").is_some());
        assert!(registry.match_sink("", "eval").is_some());
        assert!(registry.match_sink("db", "nothing").is_none());
    }

    #[test]
    fn toml_pack_extends_rules() {
        let mut registry = TaintRegistry::new();
        registry
            .load_toml(
                r#"
[[sources]]
pattern = "custom_input"
kind = "user_input"

[[sinks]]
pattern = "dangerous_call"
kind = "command"
"#,
            )
            .unwrap();
        assert!(registry.match_source("x = custom_input()").is_some());
        assert!(registry.match_sink("", "dangerous_call").is_some());
    }
}
