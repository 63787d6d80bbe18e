//! Project configuration, loaded from `.pf/config.toml`.

pub mod deps_config;
pub mod docs_config;
pub mod index_config;
pub mod taint_config;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use deps_config::DepsConfig;
pub use docs_config::DocsConfig;
pub use index_config::IndexConfig;
pub use taint_config::TaintConfig;

/// Top-level configuration for all subcommands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditorConfig {
    pub index: IndexConfig,
    pub taint: TaintConfig,
    pub deps: DepsConfig,
    pub docs: DocsConfig,
}

impl AuditorConfig {
    /// Load from `<root>/.pf/config.toml`, falling back to defaults when
    /// the file is absent. A present-but-malformed file is an error.
    pub fn load(root: &Path) -> Result<Self, toml::de::Error> {
        let path = root.join(".pf").join("config.toml");
        match std::fs::read_to_string(&path) {
            Ok(text) => toml::from_str(&text),
            Err(_) => Ok(Self::default()),
        }
    }
}
