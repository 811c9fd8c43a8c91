//! Small helpers shared by the resolver and the reflow engine.

pub mod jsonc;

use unicode_width::UnicodeWidthStr;

/// Characters that carry meaning inside a regular expression and must be
/// escaped to match themselves literally.
const REGEX_METACHARACTERS: &[char] = &['.', '*', '+', '?', '^', '$', '{', '}', '(', ')', '|', '[', ']', '\\'];

/// Escape every regex metacharacter in `token` with a backslash.
///
/// Only the characters `. * + ? ^ $ { } ( ) | [ ] \` are touched; everything
/// else passes through unchanged, so the result matches `token` literally when
/// embedded in a pattern.
///
/// Examples:
///   - `"//"` -> `"//"`
///   - `"(*"` -> `"\(\*"`
///   - `"$$"` -> `"\$\$"`
pub fn escape_regex(token: &str) -> String {
    let mut escaped = String::with_capacity(token.len() * 2);
    for c in token.chars() {
        if REGEX_METACHARACTERS.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Column width of `text` as it would appear in a terminal or editor.
///
/// A tab counts as a single column; no tab stops are assumed.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_escape_regex_plain_tokens() {
        assert_eq!(escape_regex("//"), "//");
        assert_eq!(escape_regex("#"), "#");
        assert_eq!(escape_regex("--"), "--");
        assert_eq!(escape_regex(";;"), ";;");
    }

    #[test]
    fn test_escape_regex_metacharacters() {
        assert_eq!(escape_regex("(*"), r"\(\*");
        assert_eq!(escape_regex("*)"), r"\*\)");
        assert_eq!(escape_regex("{-"), r"\{-");
        assert_eq!(escape_regex("|"), r"\|");
        assert_eq!(escape_regex(r"\"), r"\\");
        assert_eq!(escape_regex("[]^$.+?"), r"\[\]\^\$\.\+\?");
    }

    #[test]
    fn test_escaped_token_matches_only_itself() {
        let re = Regex::new(&format!("^{}$", escape_regex("a.b"))).unwrap();
        assert!(re.is_match("a.b"));
        assert!(!re.is_match("axb"));

        let re = Regex::new(&format!("^{}$", escape_regex("x+"))).unwrap();
        assert!(re.is_match("x+"));
        assert!(!re.is_match("xx"));
    }

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("// abc"), 6);
        assert_eq!(display_width(""), 0);
        // Wide CJK characters take two columns
        assert_eq!(display_width("中文"), 4);
    }

    #[test]
    fn test_display_width_counts_tab_as_one_column() {
        assert_eq!(display_width("\t"), 1);
        assert_eq!(display_width("//\tx"), 4);
    }
}
