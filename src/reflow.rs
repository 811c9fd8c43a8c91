//! Comment reflow
//!
//! Two independent passes over a [`Document`]:
//!
//! - [`split_long_comments`] breaks a comment line that is wider than the line
//!   width into two comment lines.
//! - [`group_short_comments`] pulls words from a comment line up into the
//!   comment line directly above it while the result still fits.
//!
//! Only lines that *start* with a line comment marker are touched. Every edit
//! is applied before the next line is looked at, and line ranges are fetched
//! again after each edit.

use crate::document::{Document, DocumentError, Line, TextEdit, TextRange};
use crate::resolver::CommentFormat;
use crate::utils::display_width;
use itertools::Itertools;
use regex::Regex;

/// Build `^(?:<line comment start>).*`, or `None` if the format has no line comment.
pub fn comment_regex(format: &CommentFormat) -> Option<Regex> {
    let start = format.line_comment_start.as_deref()?;
    match Regex::new(&format!("^(?:{start}).*")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            log::warn!("Invalid line comment pattern {start:?}: {e}");
            None
        }
    }
}

/// Where to break an overlong comment: words `[..j)` stay, `[j..)` move down.
///
/// `text` is split on single spaces, so runs of spaces produce empty words that
/// still count one column each. The first word is the marker, and the left-hand
/// side always keeps at least one word after it.
fn split_point(text: &str, line_width: usize) -> Option<(String, String)> {
    let words: Vec<&str> = text.split(' ').collect();
    if words.len() <= 2 {
        return None;
    }

    let mut width = display_width(words[0]) + 1 + display_width(words[1]);
    for j in 2..words.len() {
        width += 1 + display_width(words[j]);
        if width > line_width {
            // Nothing but trailing spaces left to move
            if words[j..].iter().all(|word| word.is_empty()) {
                return None;
            }
            return Some((words[..j].join(" "), words[j..].join(" ")));
        }
    }
    None
}

/// Result of pulling words from the current line into the previous one
#[derive(Debug, PartialEq, Eq)]
struct Merge {
    /// New text of the previous line
    merged: String,
    /// Number of words of the current line consumed, marker included
    taken: usize,
}

/// Largest prefix of `words[1..]` that still fits when appended to `previous`.
///
/// Every candidate is tried and the last fitting one wins; width only grows
/// with the number of words taken.
fn merge_point(previous: &str, words: &[&str], line_width: usize) -> Option<Merge> {
    let previous_words: Vec<&str> = previous.split(' ').filter(|word| !word.is_empty()).collect();

    let mut best = None;
    for j in 2..=words.len() {
        let merged = previous_words.iter().chain(&words[1..j]).join(" ");
        if display_width(&merged) <= line_width {
            best = Some(Merge { merged, taken: j });
        }
    }
    best
}

/// The literal marker a matching line starts with.
fn line_marker<'a>(format: &CommentFormat, line: &'a str, first_word: &'a str) -> &'a str {
    format.marker_of(line).unwrap_or(first_word)
}

/// Split every comment line wider than `line_width` once.
///
/// The remainder goes onto a new comment line directly below and is not itself
/// split again in this pass. Returns the number of lines split.
pub fn split_long_comments(
    document: &mut dyn Document,
    format: &CommentFormat,
    line_width: usize,
) -> Result<usize, DocumentError> {
    let Some(regex) = comment_regex(format) else {
        return Ok(0);
    };

    let mut line_count = document.line_count();
    let mut index = 0;
    let mut splits = 0;

    while index < line_count {
        let Some(line) = document.line_at(index) else {
            break;
        };
        index += 1;

        let Some(found) = regex.find(&line.text) else {
            continue;
        };
        let Some((lhs, rhs)) = split_point(found.as_str(), line_width) else {
            continue;
        };

        let first_word = found.as_str().split(' ').next().unwrap_or_default();
        let marker = line_marker(format, &line.text, first_word);
        let line_break = line.line_break_or(document.default_line_ending());
        document.apply_edits(vec![
            TextEdit::replace(line.range, lhs),
            TextEdit::insert(line.range.end, format!("{line_break}{marker} {rhs}")),
        ])?;

        line_count = document.line_count();
        // Step over the remainder line just inserted
        index += 1;
        splits += 1;
    }

    log::debug!("[reflow] Split {splits} comment lines");
    Ok(splits)
}

/// Merge runs of adjacent comment lines so each fills up to `line_width`.
///
/// A non-comment line ends a run. When a line is absorbed completely it is
/// deleted and the line that follows is tried against the same, grown, line.
/// Returns the number of merges performed.
pub fn group_short_comments(
    document: &mut dyn Document,
    format: &CommentFormat,
    line_width: usize,
) -> Result<usize, DocumentError> {
    let Some(regex) = comment_regex(format) else {
        return Ok(0);
    };

    let mut line_count = document.line_count();
    let mut previous: Option<Line> = None;
    let mut index = 0;
    let mut merges = 0;

    while index < line_count {
        let Some(line) = document.line_at(index) else {
            break;
        };
        let Some(found) = regex.find(&line.text) else {
            previous = None;
            index += 1;
            continue;
        };
        let words: Vec<&str> = found.as_str().split(' ').filter(|word| !word.is_empty()).collect();

        if let Some(prev) = &previous
            && let Some(merge) = merge_point(&prev.text, &words, line_width)
        {
            let prev_range = prev.range;
            let mut edits = vec![TextEdit::replace(prev_range, merge.merged)];

            if merge.taken < words.len() {
                let marker = line_marker(format, &line.text, words[0]);
                let rest = words[merge.taken..].join(" ");
                edits.push(TextEdit::replace(line.range, format!("{marker} {rest}")));
                document.apply_edits(edits)?;

                previous = document.line_at(index);
                index += 1;
            } else {
                let range = if line.range_including_line_break == line.range {
                    // Last line: take the preceding line break with it
                    TextRange::new(prev_range.end, line.range.end)
                } else {
                    line.range_including_line_break
                };
                edits.push(TextEdit::delete(range));
                document.apply_edits(edits)?;

                previous = document.line_at(index - 1);
            }

            line_count = document.line_count();
            merges += 1;
            continue;
        }

        previous = Some(line);
        index += 1;
    }

    log::debug!("[reflow] Merged {merges} comment lines");
    Ok(merges)
}
