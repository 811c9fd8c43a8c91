//! Relaxed JSON support.
//!
//! Language configuration files shipped with editor extensions are JSON with
//! comments and, frequently, trailing commas. `serde_json` rejects both, so the
//! content is normalised to strict JSON first.

use serde::de::DeserializeOwned;

/// Parse relaxed JSON (comments and trailing commas allowed) into `T`.
pub fn from_str<T: DeserializeOwned>(content: &str) -> serde_json::Result<T> {
    let stripped = strip_comments(content);
    serde_json::from_str(&strip_trailing_commas(&stripped))
}

/// Strip `//` and `/* */` comments, leaving string literals untouched.
///
/// Newlines inside removed comments are kept so that parse errors still point
/// at the right line.
pub fn strip_comments(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    result.push(next);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            '/' => match chars.peek() {
                Some('/') => {
                    chars.next();
                    for nc in chars.by_ref() {
                        if nc == '\n' {
                            result.push('\n');
                            break;
                        }
                    }
                }
                Some('*') => {
                    chars.next();
                    let mut prev = ' ';
                    for nc in chars.by_ref() {
                        if prev == '*' && nc == '/' {
                            break;
                        }
                        if nc == '\n' {
                            result.push('\n');
                        }
                        prev = nc;
                    }
                }
                _ => result.push(c),
            },
            _ => result.push(c),
        }
    }

    result
}

/// Drop commas that are followed (after optional whitespace) by `}` or `]`.
pub fn strip_trailing_commas(content: &str) -> String {
    let chars: Vec<char> = content.chars().collect();
    let mut result = String::with_capacity(content.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            result.push(c);
            if c == '\\' {
                if let Some(&next) = chars.get(i + 1) {
                    result.push(next);
                    i += 1;
                }
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next_significant = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next_significant, Some('}') | Some(']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
        i += 1;
    }

    result
}
