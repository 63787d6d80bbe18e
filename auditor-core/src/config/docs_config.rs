//! Documentation-fetcher configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DocsConfig {
    /// Maximum pages fetched per package. Default: 20.
    pub max_pages: Option<usize>,
    /// Floor between requests, in milliseconds. Default: 400.
    pub rate_floor_ms: Option<u64>,
}

impl DocsConfig {
    pub fn effective_max_pages(&self) -> usize {
        self.max_pages.unwrap_or(20)
    }

    pub fn effective_rate_floor_ms(&self) -> u64 {
        self.rate_floor_ms.unwrap_or(400)
    }
}
