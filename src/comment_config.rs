//! Raw comment syntax as declared in a language configuration file.
//!
//! Editor extensions ship a `language-configuration.json` per language. Only
//! its `comments` object matters here:
//!
//! ```json
//! {
//!     "comments": {
//!         "lineComment": "//",            // or ["//", "///"]
//!         "blockComment": ["/*", "*/"],
//!     },
//! }
//! ```

use crate::utils::jsonc;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;

/// The `lineComment` entry: one token or an ordered list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LineComment {
    Token(String),
    Alternatives(Vec<String>),
    /// Newer manifests use `{ "comment": "//", "noIndent": true }`
    Detailed { comment: String },
}

impl LineComment {
    /// Configured tokens in declaration order.
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            LineComment::Token(token) | LineComment::Detailed { comment: token } => vec![token.as_str()],
            LineComment::Alternatives(tokens) => tokens.iter().map(String::as_str).collect(),
        }
    }
}

/// Parsed `comments` object of a language configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentConfig {
    #[serde(default)]
    pub line_comment: Option<LineComment>,
    #[serde(default)]
    pub block_comment: Option<(String, String)>,
}

#[derive(Debug, Deserialize)]
struct LanguageConfigurationFile {
    comments: Option<CommentConfig>,
}

/// Errors that can occur when loading a language configuration file
#[derive(Debug, thiserror::Error)]
pub enum CommentConfigError {
    #[error("Failed to read language configuration at {path}: {source}")]
    IoError { source: io::Error, path: String },

    #[error("Failed to parse language configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Language configuration has no `comments` section")]
    MissingComments,
}

/// Parse the content of a language configuration file.
pub fn parse_language_configuration(content: &str) -> Result<CommentConfig, CommentConfigError> {
    let file: LanguageConfigurationFile = jsonc::from_str(content)?;
    file.comments.ok_or(CommentConfigError::MissingComments)
}

/// Read and parse a language configuration file from disk.
pub fn load_comment_config(path: &Path) -> Result<CommentConfig, CommentConfigError> {
    let content = fs::read_to_string(path).map_err(|e| CommentConfigError::IoError {
        source: e,
        path: path.display().to_string(),
    })?;
    parse_language_configuration(&content)
}
