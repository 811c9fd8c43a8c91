pub mod comment_config;
pub mod config;
pub mod document;
pub mod exit_codes;
pub mod languages;
pub mod reflow;
pub mod resolver;
pub mod utils;

pub use crate::config::{Config, Contributions, SettingsProvider};
pub use crate::document::{Document, DocumentError, TextDocument};
pub use crate::languages::LanguageRegistry;
pub use crate::resolver::{CommentFormat, CommentFormatResolver};

/// Counts of what one [`CommentWrapper::wrap`] call changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WrapSummary {
    pub lines_split: usize,
    pub lines_merged: usize,
}

impl WrapSummary {
    pub fn changed(&self) -> bool {
        self.lines_split > 0 || self.lines_merged > 0
    }
}

/// Reflows the comments of documents.
///
/// Owns the comment-format resolver and the contributed settings; the host
/// forwards its change notifications through
/// [`on_languages_changed`](Self::on_languages_changed) and
/// [`on_configuration_changed`](Self::on_configuration_changed).
#[derive(Debug)]
pub struct CommentWrapper {
    resolver: CommentFormatResolver,
    contributions: Contributions,
}

impl CommentWrapper {
    pub fn new(resolver: CommentFormatResolver, contributions: Contributions) -> Self {
        Self {
            resolver,
            contributions,
        }
    }

    pub fn resolver(&self) -> &CommentFormatResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut CommentFormatResolver {
        &mut self.resolver
    }

    pub fn line_width(&self) -> usize {
        self.contributions.line_width()
    }

    /// Split then group the comments of the active document.
    ///
    /// `None` (no active document) does nothing. The comment format is
    /// resolved once and shared by both passes.
    pub fn wrap(&mut self, active: Option<&mut dyn Document>) -> Result<WrapSummary, DocumentError> {
        let Some(document) = active else {
            return Ok(WrapSummary::default());
        };

        let language_id = document.language_id().to_string();
        let Some(format) = self.resolver.resolve(&language_id) else {
            log::debug!("No comment format for {language_id}, nothing to wrap");
            return Ok(WrapSummary::default());
        };

        let line_width = self.line_width();
        let lines_split = reflow::split_long_comments(document, &format, line_width)?;
        let lines_merged = reflow::group_short_comments(document, &format, line_width)?;
        Ok(WrapSummary {
            lines_split,
            lines_merged,
        })
    }

    /// Split overlong comment lines of `document` written in `language_id`.
    pub fn split_long_comments(
        &mut self,
        document: &mut dyn Document,
        language_id: &str,
    ) -> Result<usize, DocumentError> {
        match self.resolver.resolve(language_id) {
            Some(format) => reflow::split_long_comments(document, &format, self.contributions.line_width()),
            None => Ok(0),
        }
    }

    /// Merge short adjacent comment lines of `document` written in `language_id`.
    pub fn group_short_comments(
        &mut self,
        document: &mut dyn Document,
        language_id: &str,
    ) -> Result<usize, DocumentError> {
        match self.resolver.resolve(language_id) {
            Some(format) => reflow::group_short_comments(document, &format, self.contributions.line_width()),
            None => Ok(0),
        }
    }

    /// The set of installed language definitions changed.
    pub fn on_languages_changed(&mut self) {
        self.resolver.refresh_sources();
    }

    /// The configuration changed; re-read the line width.
    pub fn on_configuration_changed(&mut self) {
        self.contributions.reload();
    }
}
