//! Redis-style glob patterns.
//!
//! Bulk operations match keys by prefix. The prefix itself is literal text,
//! so any glob metacharacter inside it is escaped before the trailing `*`
//! is appended.

use regex::Regex;

use crate::error::{CacheError, CacheResult};

const GLOB_SPECIAL: [char; 5] = ['*', '?', '[', ']', '\\'];

/// Escape `literal` so that it matches only itself in a glob pattern.
pub fn escape(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len() + 4);
    for c in literal.chars() {
        if GLOB_SPECIAL.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Pattern matching every key that starts with `literal_prefix`.
pub fn prefix_pattern(literal_prefix: &str) -> String {
    let mut pattern = escape(literal_prefix);
    pattern.push('*');
    pattern
}

/// A compiled glob pattern.
///
/// Supports `*`, `?`, `[...]` classes (with `^` negation and ranges) and
/// backslash escapes, the subset used by `SCAN MATCH`.
#[derive(Debug, Clone)]
pub struct Glob {
    regex: Regex,
}

impl Glob {
    /// Compile `pattern`.
    pub fn new(pattern: &str) -> CacheResult<Self> {
        let regex = Regex::new(&glob_to_regex(pattern))
            .map_err(|e| CacheError::Config(format!("bad glob '{}': {}", pattern, e)))?;
        Ok(Self { regex })
    }

    /// Whether `key` matches the whole pattern.
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str("(?s:.*)"),
            '?' => out.push_str("(?s:.)"),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push_str(r"\\"),
            },
            '[' => {
                let mut class = String::from("[");
                if chars.peek() == Some(&'^') {
                    chars.next();
                    class.push('^');
                }
                let mut closed = false;
                while let Some(inner) = chars.next() {
                    match inner {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                class.push_str(&regex::escape(&escaped.to_string()));
                            }
                        }
                        '-' => class.push('-'),
                        other => class.push_str(&regex::escape(&other.to_string())),
                    }
                }
                if closed && class.len() > 1 && class != "[^" {
                    class.push(']');
                    out.push_str(&class);
                } else {
                    // Unterminated or empty class matches nothing useful; treat literally.
                    out.push_str(&regex::escape("["));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    out
}
