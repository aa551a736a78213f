// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Glob patterns used to list and clear keys.
//!
//! The syntax follows the usual key-value store conventions:
//!
//! - `*` matches any run of characters, including none
//! - `?` matches exactly one character
//! - `[abc]`, `[a-z]` match one character of a class, `[!abc]` or `[^abc]` negate it
//! - `\` makes the next character literal
//!
//! An unterminated `[` is matched literally.

use std::fmt;

use regex::Regex;

use crate::{Error, Result};

/// A compiled glob pattern.
///
/// # Examples
///
/// ```
/// use recall_store::Pattern;
///
/// let pattern = Pattern::new("user:*:[0-9]?")?;
/// assert!(pattern.matches("user:alice:42"));
/// assert!(!pattern.matches("user:alice:x2"));
/// # Ok::<(), recall_store::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Pattern {
    glob: String,
    regex: Regex,
}

impl Pattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`] if the translated expression exceeds the regex size limits.
    pub fn new(glob: &str) -> Result<Self> {
        let regex = Regex::new(&translate(glob)).map_err(|source| Error::Pattern {
            pattern: glob.to_string(),
            source,
        })?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    /// Returns `true` if the whole key matches the pattern.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// Returns the glob this pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.glob
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.glob)
    }
}

/// Escapes glob metacharacters so `literal` only matches itself.
///
/// ```
/// use recall_store::{Pattern, pattern};
///
/// let pattern = Pattern::new(&format!("{}*", pattern::escape("a[1]")))?;
/// assert!(pattern.matches("a[1]:tail"));
/// assert!(!pattern.matches("a1:tail"));
/// # Ok::<(), recall_store::Error>(())
/// ```
#[must_use]
pub fn escape(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn translate(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::with_capacity(glob.len() * 2 + 8);
    out.push_str("(?s)^");

    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => {
                if let Some(&next) = chars.get(i + 1) {
                    push_literal(&mut out, next);
                    i += 1;
                } else {
                    push_literal(&mut out, '\\');
                }
            }
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    push_class(&mut out, &chars[i + 1..end]);
                    i = end;
                }
                None => push_literal(&mut out, '['),
            },
            c => push_literal(&mut out, c),
        }
        i += 1;
    }

    out.push('$');
    out
}

/// Finds the index of the `]` closing the class opened at `start`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut i = start + 1;
    if matches!(chars.get(i), Some('!' | '^')) {
        i += 1;
    }
    // A leading `]` is a member, not the terminator.
    if chars.get(i) == Some(&']') {
        i += 1;
    }
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            ']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn push_class(out: &mut String, body: &[char]) {
    out.push('[');

    let mut i = 0;
    if matches!(body.first(), Some('!' | '^')) {
        out.push('^');
        i = 1;
    }

    let members_start = i;
    while i < body.len() {
        let c = body[i];
        let is_range = c == '-' && i > members_start && i + 1 < body.len();
        if is_range {
            out.push('-');
        } else if c == '\\' && i + 1 < body.len() {
            i += 1;
            push_class_member(out, body[i]);
        } else {
            push_class_member(out, c);
        }
        i += 1;
    }

    out.push(']');
}

fn push_class_member(out: &mut String, c: char) {
    if matches!(c, '\\' | '[' | ']' | '^' | '-' | '&' | '~') {
        out.push('\\');
    }
    out.push(c);
}

fn push_literal(out: &mut String, c: char) {
    let mut buf = [0; 4];
    out.push_str(&regex::escape(c.encode_utf8(&mut buf)));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(glob: &str, key: &str) -> bool {
        Pattern::new(glob).unwrap().matches(key)
    }

    #[test]
    fn star_matches_any_run() {
        assert!(matches("*", ""));
        assert!(matches("a*c", "abbbc"));
        assert!(matches("a*c", "ac"));
        assert!(!matches("a*c", "abd"));
    }

    #[test]
    fn star_spans_separators_and_newlines() {
        assert!(matches("ns:*", "ns:a:b:c"));
        assert!(matches("ns:*", "ns:line\nbreak"));
    }

    #[test]
    fn question_mark_matches_exactly_one() {
        assert!(matches("h?llo", "hello"));
        assert!(!matches("h?llo", "hllo"));
        assert!(!matches("h?llo", "heello"));
    }

    #[test]
    fn classes_and_ranges() {
        assert!(matches("h[ae]llo", "hallo"));
        assert!(!matches("h[ae]llo", "hillo"));
        assert!(matches("k[0-9]", "k7"));
        assert!(!matches("k[0-9]", "kx"));
    }

    #[test]
    fn negated_classes() {
        assert!(matches("h[!e]llo", "hallo"));
        assert!(!matches("h[!e]llo", "hello"));
        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
    }

    #[test]
    fn backslash_escapes_metacharacters() {
        assert!(matches(r"a\*b", "a*b"));
        assert!(!matches(r"a\*b", "axb"));
        assert!(matches(r"a\?", "a?"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("a.b+(c)", "a.b+(c)"));
        assert!(!matches("a.b", "axb"));
        assert!(matches("{\"k\":1}|$", "{\"k\":1}|$"));
    }

    #[test]
    fn unterminated_class_is_literal() {
        assert!(matches("a[b", "a[b"));
        assert!(!matches("a[b", "ab"));
    }

    #[test]
    fn leading_bracket_in_class_is_member() {
        assert!(matches("[]a]", "]"));
        assert!(matches("[]a]", "a"));
    }

    #[test]
    fn escape_round_trips_literals() {
        for literal in ["plain", "a*b", "x?y", "[1,2]", r"back\slash"] {
            assert!(matches(&escape(literal), literal), "escaped {literal} should match itself");
        }
        assert!(!matches(&escape("a*"), "abc"));
    }

    #[test]
    fn display_shows_glob() {
        let pattern = Pattern::new("ns:*").unwrap();
        assert_eq!(pattern.to_string(), "ns:*");
        assert_eq!(pattern.as_str(), "ns:*");
    }
}
