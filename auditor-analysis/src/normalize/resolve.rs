//! Reference resolution: match use-sites to project symbols.

use auditor_core::facts::rows::{RefRow, SymbolRow};
use auditor_core::types::collections::FxHashMap;

/// Name → candidate symbols, built once over the whole project.
pub struct SymbolIndex {
    by_name: FxHashMap<String, Vec<(String, i64)>>,
}

impl SymbolIndex {
    pub fn build(symbols: &[SymbolRow]) -> Self {
        let mut by_name: FxHashMap<String, Vec<(String, i64)>> = FxHashMap::default();
        for sym in symbols {
            by_name
                .entry(sym.name.clone())
                .or_default()
                .push((sym.file.clone(), sym.symbol_id));
        }
        Self { by_name }
    }

    /// Resolution chain: same-file match first, then a unique project-wide
    /// match. Ambiguous or absent names stay unresolved.
    pub fn resolve(&self, reference: &mut RefRow) {
        let Some(candidates) = self.by_name.get(&reference.name) else {
            reference.resolution = "unresolved".to_string();
            return;
        };
        if let Some((_, id)) = candidates.iter().find(|(file, _)| *file == reference.file) {
            reference.resolution = "resolved".to_string();
            reference.target_symbol_id = *id;
            return;
        }
        if candidates.len() == 1 {
            reference.resolution = "resolved".to_string();
            reference.target_symbol_id = candidates[0].1;
            return;
        }
        reference.resolution = "unresolved".to_string();
    }

    /// Import references that match no project symbol are external, not
    /// unresolved — downstream consumers treat the two differently.
    pub fn resolve_import(&self, reference: &mut RefRow) {
        if self.by_name.contains_key(&reference.name) {
            self.resolve(reference);
        } else {
            reference.resolution = "external".to_string();
        }
    }
}
