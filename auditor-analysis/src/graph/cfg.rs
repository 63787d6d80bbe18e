//! Control-flow graph reconstruction from `cfg_blocks` / `cfg_edges`
//! rows, with line-level reachability queries.

use auditor_core::errors::StorageError;
use auditor_core::traits::storage::IFactReader;
use auditor_core::types::collections::{FxHashMap, FxHashSet};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;

/// One function's CFG, rebuilt from fact rows.
pub struct FunctionCfg {
    graph: DiGraph<(u32, u32), ()>,
    by_index: FxHashMap<u32, NodeIndex>,
}

impl FunctionCfg {
    /// Load the CFG for `(file, function)`. Returns `None` when the
    /// extractor recorded no blocks — callers fall back to
    /// flow-insensitive semantics.
    pub fn load(
        store: &dyn IFactReader,
        file: &str,
        function: &str,
    ) -> Result<Option<FunctionCfg>, StorageError> {
        let blocks = store.cfg_blocks_for(file, function)?;
        if blocks.is_empty() {
            return Ok(None);
        }
        let edges = store.cfg_edges_for(file, function)?;

        let mut graph = DiGraph::new();
        let mut by_index = FxHashMap::default();
        for block in &blocks {
            let node = graph.add_node((block.line, block.end_line));
            by_index.insert(block.block_index, node);
        }
        for edge in &edges {
            if let (Some(&from), Some(&to)) =
                (by_index.get(&edge.from_block), by_index.get(&edge.to_block))
            {
                graph.add_edge(from, to, ());
            }
        }
        Ok(Some(FunctionCfg { graph, by_index }))
    }

    /// Innermost block containing a line (smallest covering span).
    fn block_of(&self, line: u32) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .filter(|&n| {
                let (start, end) = self.graph[n];
                start <= line && line <= end
            })
            .min_by_key(|&n| {
                let (start, end) = self.graph[n];
                end - start
            })
    }

    /// Whether a use at `to_line` is feasible given taint introduced at
    /// `from_line`: same block, or a CFG path between their blocks.
    pub fn line_reachable(&self, from_line: u32, to_line: u32) -> bool {
        let (Some(from), Some(to)) = (self.block_of(from_line), self.block_of(to_line)) else {
            // Lines outside any recorded block: be conservative.
            return true;
        };
        if from == to {
            return true;
        }
        let mut dfs = Dfs::new(&self.graph, from);
        while let Some(node) = dfs.next(&self.graph) {
            if node == to {
                return true;
            }
        }
        false
    }

    pub fn block_count(&self) -> usize {
        self.by_index.len()
    }
}
