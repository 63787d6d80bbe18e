//! File discovery: parallel walker, language detection, content hashing.

pub mod language_detect;
pub mod types;
pub mod walker;

pub use language_detect::Language;
pub use types::DiscoveredFile;
