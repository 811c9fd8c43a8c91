//! Output helpers for the command line

use colored::*;

const CONTEXT_LINES: usize = 3;

/// Generate a unified-style diff between the original and the reflowed text.
///
/// Reflow changes one contiguous stretch per comment block at most, but a file
/// may contain several, so the common prefix and suffix are trimmed and the
/// middle is reported as a single hunk.
pub fn generate_diff(original: &str, modified: &str, file_path: &str) -> String {
    let mut diff = String::new();

    diff.push_str(&format!("--- {file_path}\n"));
    diff.push_str(&format!("+++ {file_path} (wrapped)\n"));

    // Terminators stay attached so that a changed line ending counts as a change
    let original_lines: Vec<&str> = original.split_inclusive('\n').collect();
    let modified_lines: Vec<&str> = modified.split_inclusive('\n').collect();

    let prefix = original_lines
        .iter()
        .zip(&modified_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let max_suffix = original_lines.len().min(modified_lines.len()) - prefix;
    let suffix = original_lines
        .iter()
        .rev()
        .zip(modified_lines.iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    if prefix == original_lines.len() && prefix == modified_lines.len() {
        diff.push_str("No changes\n");
        return diff;
    }

    let context_start = prefix.saturating_sub(CONTEXT_LINES);
    let original_end = original_lines.len() - suffix;
    let modified_end = modified_lines.len() - suffix;
    let context_after = suffix.min(CONTEXT_LINES);

    diff.push_str(&format!(
        "@@ -{},{} +{},{} @@\n",
        context_start + 1,
        original_end + context_after - context_start,
        context_start + 1,
        modified_end + context_after - context_start
    ));

    for line in &original_lines[context_start..prefix] {
        diff.push_str(&format!(" {}\n", strip_line_break(line)));
    }
    for line in &original_lines[prefix..original_end] {
        diff.push_str(&format!("-{}\n", strip_line_break(line)));
    }
    for line in &modified_lines[prefix..modified_end] {
        diff.push_str(&format!("+{}\n", strip_line_break(line)));
    }
    for line in &original_lines[original_end..original_end + context_after] {
        diff.push_str(&format!(" {}\n", strip_line_break(line)));
    }

    diff
}

fn strip_line_break(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Colorize a diff produced by [`generate_diff`] for terminal output.
pub fn colorize_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            if line.starts_with("---") || line.starts_with("+++") {
                line.bold().to_string()
            } else if line.starts_with("@@") {
                line.cyan().to_string()
            } else if line.starts_with('-') {
                line.red().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
