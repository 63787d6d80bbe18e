//! Dependency-resolution errors. Registry failures are external: they
//! surface as warnings and fall back to cached or current data.

use super::error_code::{self, AuditorErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum DepsError {
    #[error("registry fetch failed for {package}: {message}")]
    RegistryFetch { package: String, message: String },

    #[error("malformed registry response for {package}: {message}")]
    RegistryMalformed { package: String, message: String },

    #[error("unparseable version tag: {tag}")]
    UnparseableTag { tag: String },

    #[error("manifest parse failed for {file}: {message}")]
    ManifestParse { file: String, message: String },

    #[error("no upgrade candidate for {package} (current {current})")]
    NoCandidate { package: String, current: String },
}

impl AuditorErrorCode for DepsError {
    fn error_code(&self) -> &'static str {
        error_code::DEPS_ERROR
    }
}
