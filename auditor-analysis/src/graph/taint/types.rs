//! Taint engine types: frames, signatures, sites, paths, reports.

use serde::{Deserialize, Serialize};

/// One hop in a trace: `(file, function, line)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallFrame {
    pub file: String,
    pub function: String,
    pub line: u32,
}

/// Ordered tuple of call frames distinguishing propagation contexts.
/// Truncated to `max_depth + 1` frames.
pub type CallSignature = Vec<CallFrame>;

/// Render a signature for visited-set membership and report output.
pub fn signature_key(sig: &CallSignature) -> String {
    let parts: Vec<String> = sig
        .iter()
        .map(|f| format!("{}:{}:{}", f.file, f.function, f.line))
        .collect();
    parts.join(">")
}

/// A site introducing tainted data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSite {
    pub file: String,
    pub function: String,
    pub line: u32,
    /// The variable the tainted value binds to.
    pub variable: String,
    pub expression: String,
    /// "user_input", "environment", "file", "deserialized".
    pub kind: String,
}

/// A site consuming tainted data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSite {
    pub file: String,
    pub function: String,
    pub line: u32,
    pub expression: String,
    /// "sql", "command", "code_eval", "template", "network_write",
    /// "dynamic_call" for halted hops.
    pub kind: String,
}

/// One emitted source→sink path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaintPath {
    pub source: SourceSite,
    pub sink: SinkSite,
    /// Intermediate frames, source first.
    pub frames: Vec<CallFrame>,
    /// The final signature; last frame's function contains the sink.
    pub call_stack: CallSignature,
    pub depth: u32,
    /// True when propagation halted at a hop that static evidence
    /// cannot see through (dynamic callee, computed target).
    pub requires_runtime_analysis: bool,
}

impl TaintPath {
    /// Deduplication key: source site, sink site, and the full stack.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}|{}:{}|{}",
            self.source.file,
            self.source.line,
            self.sink.file,
            self.sink.line,
            signature_key(&self.call_stack),
        )
    }
}

/// Full output of one taint run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaintReport {
    pub paths: Vec<TaintPath>,
    pub sources_seen: usize,
    pub sinks_seen: usize,
    /// Functions that fell back to flow-insensitive semantics for lack
    /// of CFG metadata.
    pub cfg_fallbacks: Vec<String>,
    pub cancelled: bool,
}
