//! File discovery and per-file reflow

use crate::formatter;
use colored::*;
use comment_wrapper_lib::config::Config;
use comment_wrapper_lib::document::TextDocument;
use comment_wrapper_lib::{CommentWrapper, DocumentError, LanguageRegistry, WrapSummary};
use globset::GlobSet;
use ignore::WalkBuilder;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// What to do with a reflowed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Write the result back to disk
    #[default]
    Write,
    /// Print a diff, leave the file alone
    Diff,
    /// Only report whether the file would change
    Check,
}

/// Errors raised while processing a single file
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to read {path}: {source}")]
    Read { source: io::Error, path: String },

    #[error("Failed to write {path}: {source}")]
    Write { source: io::Error, path: String },

    #[error("Failed to reflow {path}: {source}")]
    Reflow { source: DocumentError, path: String },
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub language_id: String,
    pub summary: WrapSummary,
    pub changed: bool,
}

/// Collect the files to reflow.
///
/// Directories are walked with `.gitignore` support; explicitly named files are
/// always kept. Files matching an exclude pattern are dropped either way.
pub fn find_source_files(paths: &[String], exclude: &GlobSet) -> Vec<PathBuf> {
    let roots: Vec<String> = if paths.is_empty() {
        vec![".".to_string()]
    } else {
        paths.to_vec()
    };

    let base = std::env::current_dir().ok();
    let mut files = Vec::new();
    for root in &roots {
        let root_path = Path::new(root);
        if root_path.is_file() {
            if !is_excluded(root_path, exclude, base.as_deref()) {
                files.push(root_path.to_path_buf());
            }
            continue;
        }

        for entry in WalkBuilder::new(root_path).build() {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_some_and(|t| t.is_file()) && !is_excluded(path, exclude, base.as_deref()) {
                        files.push(path.to_path_buf());
                    }
                }
                Err(e) => log::warn!("Error walking {root}: {e}"),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

/// Match `path` against the exclude patterns.
///
/// Patterns are relative, so an absolute path is also tried relative to
/// `base` (normally the working directory).
pub fn is_excluded(path: &Path, exclude: &GlobSet, base: Option<&Path>) -> bool {
    let normalized = path.strip_prefix("./").unwrap_or(path);
    if exclude.is_match(normalized) {
        return true;
    }
    base.and_then(|base| path.strip_prefix(base).ok())
        .is_some_and(|relative| exclude.is_match(relative))
}

/// Decide the language of `path`.
///
/// Precedence: the forced `--language`, then the `[languages]` table of the
/// configuration, then the extension registry.
pub fn language_for_path(
    path: &Path,
    forced: Option<&str>,
    config: &Config,
    registry: &LanguageRegistry,
) -> Option<String> {
    if let Some(language_id) = forced {
        return Some(language_id.to_string());
    }
    if let Some(extension) = path.extension().and_then(|e| e.to_str())
        && let Some(language_id) = config.languages.get(extension)
    {
        return Some(language_id.clone());
    }
    registry.language_for_path(path).map(str::to_string)
}

/// Reflowed text of one buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    pub summary: WrapSummary,
    pub text: String,
    /// The text differs from the input. This, not the edit counts, decides
    /// whether a file is rewritten or reported by `--check`.
    pub changed: bool,
}

/// Reflow a text buffer.
pub fn wrap_text(wrapper: &mut CommentWrapper, language_id: &str, content: &str) -> Result<Wrapped, DocumentError> {
    let mut document = TextDocument::new(language_id, content);
    let summary = wrapper.wrap(Some(&mut document))?;
    let text = document.text();
    Ok(Wrapped {
        summary,
        changed: text != content,
        text,
    })
}

/// Reflow one file according to `mode`.
pub fn process_file(
    wrapper: &mut CommentWrapper,
    path: &Path,
    language_id: &str,
    mode: WrapMode,
    quiet: bool,
) -> Result<FileOutcome, ProcessError> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| ProcessError::Read {
        source: e,
        path: path_str.clone(),
    })?;

    let Wrapped {
        summary,
        text: wrapped,
        changed,
    } = wrap_text(wrapper, language_id, &content).map_err(|e| ProcessError::Reflow {
        source: e,
        path: path_str.clone(),
    })?;

    if changed {
        match mode {
            WrapMode::Write => {
                fs::write(path, &wrapped).map_err(|e| ProcessError::Write {
                    source: e,
                    path: path_str.clone(),
                })?;
                if !quiet {
                    println!(
                        "{} {} ({} split, {} merged)",
                        "Wrapped".green().bold(),
                        path_str,
                        summary.lines_split,
                        summary.lines_merged
                    );
                }
            }
            WrapMode::Diff => {
                let diff = formatter::generate_diff(&content, &wrapped, &path_str);
                println!("{}", formatter::colorize_diff(&diff));
            }
            WrapMode::Check => {
                if !quiet {
                    println!("{} {}", "Would wrap".yellow().bold(), path_str);
                }
            }
        }
    } else {
        log::debug!("{path_str}: comments already wrapped");
    }

    Ok(FileOutcome {
        path: path.to_path_buf(),
        language_id: language_id.to_string(),
        summary,
        changed,
    })
}
