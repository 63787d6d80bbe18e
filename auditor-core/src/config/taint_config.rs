//! Taint-engine configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TaintConfig {
    /// Maximum inter-procedural depth. Default: 12.
    pub max_depth: Option<u32>,
    /// Cap on call-stack signatures retained per visited state. Default: 32.
    pub signature_cap: Option<usize>,
    /// Re-entries of the same function allowed per signature before the
    /// cycle is cut. Default: 2.
    pub recursion_limit: Option<u32>,
    /// Extra rule-pack TOML paths.
    #[serde(default)]
    pub rule_packs: Vec<String>,
}

impl TaintConfig {
    pub fn effective_max_depth(&self) -> u32 {
        self.max_depth.unwrap_or(12)
    }

    pub fn effective_signature_cap(&self) -> usize {
        self.signature_cap.unwrap_or(32)
    }

    pub fn effective_recursion_limit(&self) -> u32 {
        self.recursion_limit.unwrap_or(2)
    }
}
