//! Documentation-fetcher errors. All recoverable: the fetcher degrades
//! to README-only or cached content and reports a warning.

use super::error_code::{self, AuditorErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum DocsError {
    #[error("fetch failed for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("no documentation source found for {package}@{version}")]
    NoSource { package: String, version: String },

    #[error("io error writing {path}: {message}")]
    Io { path: String, message: String },
}

impl AuditorErrorCode for DocsError {
    fn error_code(&self) -> &'static str {
        error_code::DOCS_ERROR
    }
}
