//! The normalizer: canonical paths, stable ids, reference resolution,
//! cross-file dedup, and the flush to the Fact Store.

pub mod normalizer;
pub mod paths;
pub mod resolve;

pub use normalizer::Normalizer;
