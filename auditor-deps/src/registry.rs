//! Registry clients: package indexes and container registries.
//!
//! All endpoints are HTTP GET returning JSON or tag lists. Responses
//! are parsed semantically — no lexicographic tag ordering anywhere.
//! Failures are external: callers fall back to the current version and
//! surface a warning.

use std::time::Duration;

use auditor_core::errors::DepsError;
use serde_json::Value;

/// Blocking registry client with a shared agent and timeout.
pub struct RegistryClient {
    agent: ureq::Agent,
}

impl RegistryClient {
    pub fn new(timeout_secs: u64) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(timeout_secs))
            .build();
        Self { agent }
    }

    fn get_json(&self, package: &str, url: &str) -> Result<Value, DepsError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| DepsError::RegistryFetch {
                package: package.to_string(),
                message: e.to_string(),
            })?;
        response
            .into_json::<Value>()
            .map_err(|e| DepsError::RegistryMalformed {
                package: package.to_string(),
                message: e.to_string(),
            })
    }

    /// Released versions of a PyPI package.
    pub fn pypi_versions(&self, package: &str) -> Result<Vec<String>, DepsError> {
        let url = format!("https://pypi.org/pypi/{package}/json");
        let json = self.get_json(package, &url)?;
        let releases = json["releases"]
            .as_object()
            .ok_or_else(|| DepsError::RegistryMalformed {
                package: package.to_string(),
                message: "missing releases map".to_string(),
            })?;
        Ok(releases.keys().cloned().collect())
    }

    /// Released versions of an npm package.
    pub fn npm_versions(&self, package: &str) -> Result<Vec<String>, DepsError> {
        let url = format!("https://registry.npmjs.org/{package}");
        let json = self.get_json(package, &url)?;
        let versions = json["versions"]
            .as_object()
            .ok_or_else(|| DepsError::RegistryMalformed {
                package: package.to_string(),
                message: "missing versions map".to_string(),
            })?;
        Ok(versions.keys().cloned().collect())
    }

    /// Released versions of a crates.io crate.
    pub fn crates_versions(&self, package: &str) -> Result<Vec<String>, DepsError> {
        let url = format!("https://crates.io/api/v1/crates/{package}");
        let json = self.get_json(package, &url)?;
        let versions = json["versions"]
            .as_array()
            .ok_or_else(|| DepsError::RegistryMalformed {
                package: package.to_string(),
                message: "missing versions array".to_string(),
            })?;
        Ok(versions
            .iter()
            .filter_map(|v| v["num"].as_str().map(String::from))
            .collect())
    }

    /// Tags of a Docker Hub repository (library namespace for bare
    /// image names). Paginates until exhausted or `max_pages`.
    pub fn docker_tags(&self, image: &str, max_pages: usize) -> Result<Vec<String>, DepsError> {
        let repository = if image.contains('/') {
            image.to_string()
        } else {
            format!("library/{image}")
        };
        let mut url = format!(
            "https://hub.docker.com/v2/repositories/{repository}/tags?page_size=100"
        );
        let mut tags = Vec::new();
        for _ in 0..max_pages {
            let json = self.get_json(image, &url)?;
            if let Some(results) = json["results"].as_array() {
                tags.extend(
                    results
                        .iter()
                        .filter_map(|r| r["name"].as_str().map(String::from)),
                );
            }
            match json["next"].as_str() {
                Some(next) if !next.is_empty() => url = next.to_string(),
                _ => break,
            }
        }
        Ok(tags)
    }

    /// Metadata URLs for the docs fetcher: PyPI documentation/homepage.
    pub fn pypi_doc_urls(&self, package: &str) -> Result<Vec<String>, DepsError> {
        let url = format!("https://pypi.org/pypi/{package}/json");
        let json = self.get_json(package, &url)?;
        let mut urls = Vec::new();
        if let Some(project_urls) = json["info"]["project_urls"].as_object() {
            for (key, value) in project_urls {
                let lower = key.to_ascii_lowercase();
                if lower.contains("doc") || lower.contains("home") {
                    if let Some(u) = value.as_str() {
                        urls.push(u.to_string());
                    }
                }
            }
        }
        if let Some(home) = json["info"]["home_page"].as_str() {
            if !home.is_empty() {
                urls.push(home.to_string());
            }
        }
        urls.dedup();
        Ok(urls)
    }
}
