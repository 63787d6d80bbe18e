//! Graph-based analyses: per-function control-flow graphs and the
//! inter-procedural taint engine.

pub mod cfg;
pub mod taint;
