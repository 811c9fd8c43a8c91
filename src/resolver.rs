//! Comment-format resolution.
//!
//! Turns the raw comment syntax of a language into regex-ready patterns and
//! caches both the raw config and the derived format per language id.

use crate::comment_config::{self, CommentConfig, LineComment};
use crate::languages::LanguageRegistry;
use crate::utils::escape_regex;
use std::collections::HashMap;

/// Regex-escaped block comment delimiters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockCommentFormat {
    pub start: String,
    pub end: String,
}

/// Regex-ready comment syntax for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFormat {
    /// Alternation of escaped line comment tokens, e.g. `//|///`
    pub line_comment_start: Option<String>,
    /// Escaped block comment delimiters
    pub block_comment: Option<BlockCommentFormat>,
    /// The unescaped line comment tokens, in declaration order
    pub line_comment_tokens: Vec<String>,
}

impl CommentFormat {
    /// Derive the format from raw comment syntax.
    pub fn from_config(config: &CommentConfig) -> Self {
        let line_comment_tokens: Vec<String> = config
            .line_comment
            .as_ref()
            .map(LineComment::tokens)
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();

        let line_comment_start = if line_comment_tokens.is_empty() {
            None
        } else {
            Some(
                line_comment_tokens
                    .iter()
                    .map(|token| escape_regex(token))
                    .collect::<Vec<_>>()
                    .join("|"),
            )
        };

        let block_comment = config.block_comment.as_ref().map(|(start, end)| BlockCommentFormat {
            start: escape_regex(start),
            end: escape_regex(end),
        });

        Self {
            line_comment_start,
            block_comment,
            line_comment_tokens,
        }
    }

    /// The literal line comment token `text` starts with, preferring the
    /// longest configured token when several match.
    pub fn marker_of<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.line_comment_tokens
            .iter()
            .filter(|token| !token.is_empty() && text.starts_with(token.as_str()))
            .map(|token| &text[..token.len()])
            .max_by_key(|marker| marker.len())
    }
}

/// Resolves and caches comment formats, keyed by language id.
///
/// Cache entries survive [`refresh_sources`](Self::refresh_sources); use
/// [`invalidate`](Self::invalidate) or [`clear_cache`](Self::clear_cache) to
/// pick up edited language configuration files.
#[derive(Debug, Default)]
pub struct CommentFormatResolver {
    registry: LanguageRegistry,
    configs: HashMap<String, CommentConfig>,
    formats: HashMap<String, CommentFormat>,
}

impl CommentFormatResolver {
    pub fn new(registry: LanguageRegistry) -> Self {
        Self {
            registry,
            configs: HashMap::new(),
            formats: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &LanguageRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut LanguageRegistry {
        &mut self.registry
    }

    /// Resolve the comment format of `language_id`.
    ///
    /// Returns `None` when the language is unknown or its configuration cannot
    /// be read or parsed. Neither case is cached, so a later call retries.
    pub fn resolve(&mut self, language_id: &str) -> Option<CommentFormat> {
        if let Some(format) = self.formats.get(language_id) {
            return Some(format.clone());
        }

        let config = self.comment_config(language_id)?;
        let format = CommentFormat::from_config(&config);
        log::debug!(
            "[resolver] Resolved {language_id}: line comment {:?}, block comment {:?}",
            format.line_comment_start,
            format.block_comment
        );
        self.formats.insert(language_id.to_string(), format.clone());
        Some(format)
    }

    /// Raw comment syntax for `language_id`, from cache or disk.
    pub fn comment_config(&mut self, language_id: &str) -> Option<CommentConfig> {
        if let Some(config) = self.configs.get(language_id) {
            return Some(config.clone());
        }

        let Some(path) = self.registry.configuration_path(language_id) else {
            log::debug!("[resolver] No language configuration registered for {language_id}");
            return None;
        };

        match comment_config::load_comment_config(path) {
            Ok(config) => {
                self.configs.insert(language_id.to_string(), config.clone());
                Some(config)
            }
            Err(e) => {
                log::debug!("[resolver] Ignoring comment syntax of {language_id} ({}): {e}", path.display());
                self.configs.remove(language_id);
                None
            }
        }
    }

    /// Rebuild the language id → configuration file map from the extension roots.
    pub fn refresh_sources(&mut self) {
        self.registry.rebuild();
    }

    /// Forget everything cached for `language_id`.
    pub fn invalidate(&mut self, language_id: &str) {
        self.configs.remove(language_id);
        self.formats.remove(language_id);
    }

    /// Forget every cached config and format.
    pub fn clear_cache(&mut self) {
        self.configs.clear();
        self.formats.clear();
    }

    pub fn is_cached(&self, language_id: &str) -> bool {
        self.formats.contains_key(language_id)
    }
}
