//! Version-aware documentation fetching.
//!
//! URL candidates are probed in declared order — `/{version}/`,
//! `/en/{version}/`, `/v{version}/`, `/{major}.x/`, then the bare base
//! — and crawling stays on the first host that answers. Requests are
//! rate-limited with a per-request floor. A capsule degrades to a
//! single README page when no versioned tree exists; it never ends up
//! without a `meta.json`.

use std::path::Path;
use std::time::{Duration, Instant};

use auditor_core::config::DocsConfig;
use auditor_core::errors::DocsError;

use super::html;
use super::store::{self, DocsMeta};

pub struct DocsFetcher {
    agent: ureq::Agent,
    config: DocsConfig,
    last_request: std::cell::Cell<Option<Instant>>,
}

impl DocsFetcher {
    pub fn new(config: DocsConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(15))
            .build();
        Self {
            agent,
            config,
            last_request: std::cell::Cell::new(None),
        }
    }

    /// Fetch documentation for one package into the capsule layout.
    ///
    /// `base_urls` come from registry metadata (documentation/homepage
    /// entries). Returns the written manifest.
    pub fn fetch(
        &self,
        docs_root: &Path,
        ecosystem: &str,
        package: &str,
        version: &str,
        base_urls: &[String],
    ) -> Result<DocsMeta, DocsError> {
        let dir = store::capsule_dir(docs_root, ecosystem, package, version);
        let max_pages = self.config.effective_max_pages();

        let mut meta = DocsMeta {
            package: package.to_string(),
            version: version.to_string(),
            ecosystem: ecosystem.to_string(),
            source_urls: Vec::new(),
            fetched_at: now_secs(),
            files: Vec::new(),
        };

        'bases: for base in base_urls {
            for candidate in version_url_candidates(base, version) {
                let page = match self.fetch_page(&candidate) {
                    Ok(page) => page,
                    Err(e) => {
                        tracing::debug!(url = %candidate, error = %e, "doc candidate missed");
                        continue;
                    }
                };
                // Root page answered: crawl same-host links from here.
                let stem = if page.title.is_empty() {
                    "index"
                } else {
                    page.title.as_str()
                };
                let file = store::write_page(&dir, stem, &page.markdown)?;
                meta.source_urls.push(candidate.clone());
                meta.files.push(file);

                let mut queue: Vec<String> = page
                    .links
                    .iter()
                    .filter_map(|l| same_host(&candidate, l))
                    .collect();
                queue.dedup();

                while let Some(url) = queue.pop() {
                    if meta.files.len() >= max_pages {
                        break;
                    }
                    if meta.source_urls.contains(&url) {
                        continue;
                    }
                    let Ok(page) = self.fetch_page(&url) else { continue };
                    if page.markdown.is_empty() {
                        continue;
                    }
                    let stem = if page.title.is_empty() {
                        url.rsplit('/').find(|s| !s.is_empty()).unwrap_or("page")
                    } else {
                        page.title.as_str()
                    };
                    let file = store::write_page(&dir, stem, &page.markdown)?;
                    meta.source_urls.push(url);
                    meta.files.push(file);
                }
                break 'bases;
            }
        }

        if meta.files.is_empty() {
            return Err(DocsError::NoSource {
                package: package.to_string(),
                version: version.to_string(),
            });
        }

        store::write_meta(&dir, &meta)?;
        Ok(meta)
    }

    fn fetch_page(&self, url: &str) -> Result<html::ConvertedPage, DocsError> {
        self.rate_limit();
        let response = self.agent.get(url).call().map_err(|e| DocsError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let body = response.into_string().map_err(|e| DocsError::Fetch {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        Ok(html::to_markdown(&body))
    }

    /// Per-request floor: hundreds of milliseconds between requests.
    fn rate_limit(&self) {
        let floor = Duration::from_millis(self.config.effective_rate_floor_ms());
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < floor {
                std::thread::sleep(floor - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

/// Versioned URL patterns, most specific first.
pub fn version_url_candidates(base: &str, version: &str) -> Vec<String> {
    let base = base.trim_end_matches('/');
    let major = version.split('.').next().unwrap_or(version);
    vec![
        format!("{base}/{version}/"),
        format!("{base}/en/{version}/"),
        format!("{base}/v{version}/"),
        format!("{base}/{major}.x/"),
        format!("{base}/en/stable/"),
        format!("{base}/"),
    ]
}

/// Resolve a link against its page, keeping only same-host results.
fn same_host(page_url: &str, link: &str) -> Option<String> {
    if link.starts_with('#') || link.starts_with("mailto:") {
        return None;
    }
    let host_of = |url: &str| -> Option<String> {
        let rest = url.split("://").nth(1)?;
        Some(rest.split('/').next()?.to_string())
    };
    if link.starts_with("http://") || link.starts_with("https://") {
        if host_of(page_url)? == host_of(link)? {
            return Some(link.to_string());
        }
        return None;
    }
    if let Some(stripped) = link.strip_prefix('/') {
        let scheme_host = page_url
            .split('/')
            .take(3)
            .collect::<Vec<_>>()
            .join("/");
        return Some(format!("{scheme_host}/{stripped}"));
    }
    // Relative link against the page directory.
    let dir = page_url.rsplit_once('/').map(|(d, _)| d).unwrap_or(page_url);
    Some(format!("{dir}/{link}"))
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_order_is_declared() {
        let candidates = version_url_candidates("https://docs.example.org", "2.3.1");
        assert_eq!(candidates[0], "https://docs.example.org/2.3.1/");
        assert_eq!(candidates[1], "https://docs.example.org/en/2.3.1/");
        assert_eq!(candidates[2], "https://docs.example.org/v2.3.1/");
        assert_eq!(candidates[3], "https://docs.example.org/2.x/");
    }

    #[test]
    fn same_host_filtering() {
        let page = "https://docs.example.org/en/2.3.1/";
        assert_eq!(
            same_host(page, "/api/index.html"),
            Some("https://docs.example.org/api/index.html".to_string())
        );
        assert_eq!(same_host(page, "https://other.org/x"), None);
        assert_eq!(same_host(page, "#section"), None);
    }
}
