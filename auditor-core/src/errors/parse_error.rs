//! Parser errors. A parse failure is recorded against its file and the
//! pipeline continues with the remaining files.

use super::error_code::{self, AuditorErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unsupported language for extension: {extension}")]
    UnsupportedLanguage { extension: String },

    #[error("tree-sitter failed to produce a tree for {file}")]
    TreeUnavailable { file: String },

    #[error("source is not valid UTF-8: {file}")]
    InvalidEncoding { file: String },
}

impl AuditorErrorCode for ParseError {
    fn error_code(&self) -> &'static str {
        error_code::PARSE_FAILED
    }
}
