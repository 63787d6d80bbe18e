//! Visited-state tracking with per-state signature sets.
//!
//! Two worklist items with the same state key but different call
//! signatures are BOTH processed — collapsing on state alone is exactly
//! the bug that loses controller attribution. The signature set per
//! state is capped; when the cap is hit the earliest-encountered
//! signatures are retained (deterministic under the engine's ordered
//! traversal) and the truncation is logged at debug level.

use auditor_core::types::collections::FxHashMap;

use super::types::{signature_key, CallSignature};

/// Signature set for one visited state.
#[derive(Debug, Default)]
struct SignatureSet {
    /// Insertion-ordered keys; earliest retained on overflow.
    keys: Vec<String>,
    truncated: bool,
}

/// Visited map: state key → signatures already processed for it.
#[derive(Debug)]
pub struct VisitedMap {
    states: FxHashMap<String, SignatureSet>,
    cap: usize,
}

impl VisitedMap {
    pub fn new(cap: usize) -> Self {
        Self {
            states: FxHashMap::default(),
            cap,
        }
    }

    /// Record a signature for a state. Returns `true` when the item must
    /// be processed (signature unseen and under the cap).
    pub fn insert(&mut self, state_key: &str, signature: &CallSignature) -> bool {
        let key = signature_key(signature);
        let set = self.states.entry(state_key.to_string()).or_default();
        if set.keys.iter().any(|k| *k == key) {
            return false;
        }
        if set.keys.len() >= self.cap {
            if !set.truncated {
                set.truncated = true;
                tracing::debug!(
                    state = state_key,
                    cap = self.cap,
                    "signature cap reached; earliest signatures retained"
                );
            }
            return false;
        }
        set.keys.push(key);
        true
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn truncated_states(&self) -> usize {
        self.states.values().filter(|s| s.truncated).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::taint::types::CallFrame;

    fn sig(line: u32) -> CallSignature {
        vec![CallFrame {
            file: "a.py".into(),
            function: "f".into(),
            line,
        }]
    }

    #[test]
    fn same_state_different_signature_both_processed() {
        let mut visited = VisitedMap::new(32);
        assert!(visited.insert("a.py|f|x", &sig(1)));
        assert!(visited.insert("a.py|f|x", &sig(2)));
        assert!(!visited.insert("a.py|f|x", &sig(1)));
    }

    #[test]
    fn cap_retains_earliest() {
        let mut visited = VisitedMap::new(2);
        assert!(visited.insert("s", &sig(1)));
        assert!(visited.insert("s", &sig(2)));
        assert!(!visited.insert("s", &sig(3)));
        // Earliest signatures still refused as duplicates.
        assert!(!visited.insert("s", &sig(1)));
        assert_eq!(visited.truncated_states(), 1);
    }
}
