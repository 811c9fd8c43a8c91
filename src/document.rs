//! Line-oriented document model.
//!
//! The reflow engine only needs random access to lines, a line count, and a way
//! to apply a batch of edits atomically. [`Document`] captures that contract;
//! [`TextDocument`] is the in-memory implementation used by the CLI and tests.
//!
//! All offsets are byte offsets into the document text exactly as it was read.
//! Lines are split on `\n` only; a `\r` directly before it belongs to the
//! terminator, any other `\r` is line content. Ranges handed out by
//! [`Document::line_at`] are only valid until the next successful
//! [`Document::apply_edits`] call.

use std::fmt;

/// Half-open byte span `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A snapshot of one line of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 0-based line index
    pub index: usize,
    /// Line text without its terminator
    pub text: String,
    /// Span of `text`
    pub range: TextRange,
    /// Span of `text` plus its terminator (equal to `range` on the last line)
    pub range_including_line_break: TextRange,
    /// Terminator of this line, `None` on the last line
    pub line_ending: Option<LineEnding>,
}

impl Line {
    /// Terminator to use for a line inserted after this one.
    pub fn line_break_or(&self, fallback: LineEnding) -> &'static str {
        self.line_ending.unwrap_or(fallback).as_str()
    }
}

/// A single edit, expressed against the document as it was before the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextEdit {
    Replace { range: TextRange, text: String },
    Insert { offset: usize, text: String },
    Delete { range: TextRange },
}

impl TextEdit {
    pub fn replace(range: TextRange, text: impl Into<String>) -> Self {
        Self::Replace {
            range,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::Insert {
            offset,
            text: text.into(),
        }
    }

    pub fn delete(range: TextRange) -> Self {
        Self::Delete { range }
    }

    fn range(&self) -> TextRange {
        match self {
            Self::Replace { range, .. } | Self::Delete { range } => *range,
            Self::Insert { offset, .. } => TextRange::new(*offset, *offset),
        }
    }

    fn replacement(&self) -> &str {
        match self {
            Self::Replace { text, .. } | Self::Insert { text, .. } => text,
            Self::Delete { .. } => "",
        }
    }
}

/// Errors raised when an edit batch cannot be applied
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("edit range {start}..{end} is outside the document (length {len})")]
    OutOfBounds { start: usize, end: usize, len: usize },

    #[error("edit range {start}..{end} does not fall on a character boundary")]
    NotCharBoundary { start: usize, end: usize },

    #[error("edits overlap at offset {offset}")]
    OverlappingEdits { offset: usize },
}

/// The editing surface the reflow engine works against.
pub trait Document {
    /// Identifier of the language the document is written in (e.g. `"rust"`).
    fn language_id(&self) -> &str;

    /// Current number of lines. An empty document has one empty line.
    fn line_count(&self) -> usize;

    /// Snapshot of line `index`, or `None` past the end.
    fn line_at(&self, index: usize) -> Option<Line>;

    /// Apply all edits as one transaction. On error the document is unchanged.
    fn apply_edits(&mut self, edits: Vec<TextEdit>) -> Result<(), DocumentError>;

    /// Terminator for new lines where no neighbouring line dictates one.
    fn default_line_ending(&self) -> LineEnding {
        LineEnding::Unix
    }
}

/// Line terminator of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Unix,    // \n (LF)
    Windows, // \r\n (CRLF)
}

impl LineEnding {
    /// Style of the first terminator in `content`, `Unix` if there is none.
    pub fn detect(content: &str) -> Self {
        match content.find('\n') {
            Some(i) if content[..i].ends_with('\r') => LineEnding::Windows,
            _ => LineEnding::Unix,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Unix => "\n",
            LineEnding::Windows => "\r\n",
        }
    }
}

/// In-memory [`Document`] backed by a single `String`.
///
/// The text is kept byte for byte; every line keeps its own terminator.
#[derive(Debug, Clone)]
pub struct TextDocument {
    language_id: String,
    content: String,
    line_starts: Vec<usize>,
    line_ending: LineEnding,
}

impl TextDocument {
    pub fn new(language_id: impl Into<String>, content: &str) -> Self {
        Self {
            language_id: language_id.into(),
            content: content.to_string(),
            line_starts: compute_line_starts(content),
            line_ending: LineEnding::detect(content),
        }
    }

    /// Terminator used for lines inserted after the last line.
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    pub fn text(&self) -> String {
        self.content.clone()
    }

    /// Lines without terminators, mainly for assertions.
    pub fn lines(&self) -> Vec<String> {
        (0..self.line_count())
            .filter_map(|i| self.line_at(i))
            .map(|line| line.text)
            .collect()
    }

    fn validate(&self, edits: &mut [TextEdit]) -> Result<(), DocumentError> {
        let len = self.content.len();
        for edit in edits.iter() {
            let range = edit.range();
            if range.start > range.end || range.end > len {
                return Err(DocumentError::OutOfBounds {
                    start: range.start,
                    end: range.end,
                    len,
                });
            }
            if !self.content.is_char_boundary(range.start) || !self.content.is_char_boundary(range.end) {
                return Err(DocumentError::NotCharBoundary {
                    start: range.start,
                    end: range.end,
                });
            }
        }

        // Inserts sort before a replacement starting at the same offset so that
        // "insert at end of line" and "replace next line" can share a boundary.
        edits.sort_by_key(|edit| {
            let range = edit.range();
            (range.start, !range.is_empty(), range.end)
        });
        for pair in edits.windows(2) {
            let (first, second) = (pair[0].range(), pair[1].range());
            let touching_inserts = first.is_empty() && second.is_empty() && first.start == second.start;
            if first.end > second.start || touching_inserts {
                return Err(DocumentError::OverlappingEdits { offset: second.start });
            }
        }
        Ok(())
    }
}

impl Document for TextDocument {
    fn language_id(&self) -> &str {
        &self.language_id
    }

    fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    fn line_at(&self, index: usize) -> Option<Line> {
        let start = *self.line_starts.get(index)?;
        let (end, end_with_break, line_ending) = match self.line_starts.get(index + 1) {
            Some(&next) if self.content[start..next - 1].ends_with('\r') => {
                (next - 2, next, Some(LineEnding::Windows))
            }
            Some(&next) => (next - 1, next, Some(LineEnding::Unix)),
            None => (self.content.len(), self.content.len(), None),
        };

        Some(Line {
            index,
            text: self.content[start..end].to_string(),
            range: TextRange::new(start, end),
            range_including_line_break: TextRange::new(start, end_with_break),
            line_ending,
        })
    }

    fn apply_edits(&mut self, mut edits: Vec<TextEdit>) -> Result<(), DocumentError> {
        if edits.is_empty() {
            return Ok(());
        }
        self.validate(&mut edits)?;

        // Apply back to front so earlier offsets stay valid.
        for edit in edits.iter().rev() {
            let range = edit.range();
            self.content.replace_range(range.start..range.end, edit.replacement());
        }
        self.line_starts = compute_line_starts(&self.content);
        Ok(())
    }

    fn default_line_ending(&self) -> LineEnding {
        self.line_ending
    }
}

impl fmt::Display for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

fn compute_line_starts(content: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(content.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}
