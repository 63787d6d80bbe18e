//! Parse cache keyed on (content hash, language).
//!
//! Vendored or generated duplicates are common enough that re-parsing
//! identical content is measurable; the cache is within-run only.

use moka::sync::Cache;

use crate::scanner::language_detect::Language;

use super::tree::ParsedTree;

const DEFAULT_CAPACITY: u64 = 2_048;

pub struct ParseCache {
    cache: Cache<(u64, Language), ParsedTree>,
}

impl ParseCache {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::new(capacity),
        }
    }

    pub fn get(&self, content_hash: u64, lang: Language) -> Option<ParsedTree> {
        self.cache.get(&(content_hash, lang))
    }

    pub fn insert(&self, content_hash: u64, lang: Language, tree: ParsedTree) {
        self.cache.insert((content_hash, lang), tree);
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
