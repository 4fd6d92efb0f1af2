/*
 * template.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Placeholder grammar.
//!
//! A placeholder is written `${{name}}` or `${{name.argument}}`:
//!
//! - `name` matches `[A-Za-z0-9_-]*` (it may be empty)
//! - `argument` runs up to the first `}}` and may contain anything except the
//!   opening sequence `${{`. A placeholder whose argument contains another
//!   placeholder is therefore not matched itself; the inner one is, and once it
//!   has been substituted the outer one becomes matchable on a later sweep.
//! - a backslash directly before the `$` escapes the placeholder. Escaped
//!   placeholders are never matched; [`unescape`] removes the backslash once
//!   evaluation is finished.
//!
//! All delimiters are ASCII, so byte offsets returned here are always valid
//! `str` boundaries.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

const OPEN: &str = "${{";
const ESCAPED_OPEN: &str = "\\${{";

/// `${{name}}` or `${{name.argument}}`, the argument ending at the first `}}`.
///
/// The escape and the "no `${{` in the argument" rules need lookaround, which
/// `regex` lacks; they are checked on each match instead.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\$\{\{(?P<name>[A-Za-z0-9_-]*)(?:\.(?P<argument>.*?))?\}\}")
        .expect("placeholder pattern is valid")
});

/// A placeholder found in a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// Byte offset of the leading `$`.
    pub start: usize,
    /// Byte offset just past the closing `}}`.
    pub end: usize,
    /// Evaluator name.
    pub name: &'a str,
    /// Text after the `.`, if any.
    pub argument: Option<&'a str>,
}

impl Placeholder<'_> {
    /// The argument passed to the evaluator (empty when there is none).
    pub fn argument_or_empty(&self) -> &str {
        self.argument.unwrap_or("")
    }
}

/// Find every unescaped placeholder in `text`, left to right, non-overlapping.
pub fn placeholders(text: &str) -> Vec<Placeholder<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;

    while let Some(captures) = PLACEHOLDER.captures_at(text, cursor) {
        let Some(whole) = captures.get(0) else {
            break;
        };

        match accept(text, &captures) {
            Some(placeholder) => {
                cursor = placeholder.end;
                found.push(placeholder);
            }
            // retry one byte on: an inner placeholder may start inside this match
            None => cursor = whole.start() + 1,
        }
    }

    found
}

/// Return the placeholder if it spans the whole of `text`.
///
/// Strings that are exactly one placeholder are replaced by the evaluator's
/// typed value rather than its string form.
pub fn full_match(text: &str) -> Option<Placeholder<'_>> {
    let placeholder = accept(text, &PLACEHOLDER.captures(text)?)?;
    (placeholder.start == 0 && placeholder.end == text.len()).then_some(placeholder)
}

/// Check whether `text` contains at least one unescaped placeholder.
pub fn contains_placeholder(text: &str) -> bool {
    !placeholders(text).is_empty()
}

/// Remove the escaping backslash from every `\${{`.
pub fn unescape(text: &str) -> Cow<'_, str> {
    if text.contains(ESCAPED_OPEN) {
        Cow::Owned(text.replace(ESCAPED_OPEN, OPEN))
    } else {
        Cow::Borrowed(text)
    }
}

/// Turn a regex match into a placeholder, unless it is escaped or its
/// argument still contains an unresolved placeholder.
fn accept<'a>(text: &'a str, captures: &Captures<'a>) -> Option<Placeholder<'a>> {
    let whole = captures.get(0)?;
    if text[..whole.start()].ends_with('\\') {
        return None;
    }

    let argument = captures.name("argument").map(|m| m.as_str());
    if argument.is_some_and(|argument| argument.contains(OPEN)) {
        return None;
    }

    Some(Placeholder {
        start: whole.start(),
        end: whole.end(),
        name: captures.name("name").map_or("", |m| m.as_str()),
        argument,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(text: &str) -> Vec<(&str, Option<&str>)> {
        placeholders(text)
            .into_iter()
            .map(|p| (p.name, p.argument))
            .collect()
    }

    #[test]
    fn test_name_only() {
        let p = full_match("${{foo}}").unwrap();
        assert_eq!(p.name, "foo");
        assert_eq!(p.argument, None);
        assert_eq!(p.argument_or_empty(), "");
    }

    #[test]
    fn test_name_and_argument() {
        let p = full_match("${{foo.bar}}").unwrap();
        assert_eq!(p.name, "foo");
        assert_eq!(p.argument, Some("bar"));
    }

    #[test]
    fn test_argument_keeps_dots_and_spaces() {
        let p = full_match("${{pyeval.1.5 * 2}}").unwrap();
        assert_eq!(p.name, "pyeval");
        assert_eq!(p.argument, Some("1.5 * 2"));
    }

    #[test]
    fn test_empty_name() {
        let p = full_match("${{}}").unwrap();
        assert_eq!(p.name, "");
        assert_eq!(p.argument, None);
    }

    #[test]
    fn test_substring_matches() {
        assert_eq!(
            names("some ${{eval.val}} string ${{other}}!"),
            vec![("eval", Some("val")), ("other", None)]
        );
        assert!(full_match("some ${{eval.val}} string").is_none());
    }

    #[test]
    fn test_adjacent_placeholders() {
        assert_eq!(
            names("${{a.1}}${{b.2}}"),
            vec![("a", Some("1")), ("b", Some("2"))]
        );
        assert!(full_match("${{a.1}}${{b.2}}").is_none());
    }

    #[test]
    fn test_escaped_placeholder_is_skipped() {
        assert!(placeholders(r"\${{var.x}}").is_empty());
        assert_eq!(names(r"\${{var.x}} ${{var.y}}"), vec![("var", Some("y"))]);
        assert!(full_match(r"\${{var.x}}").is_none());
    }

    #[test]
    fn test_nested_placeholder_matches_inner_first() {
        let text = "${{var.${{env.KEY}}}}";
        let found = placeholders(text);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "env");
        assert_eq!(found[0].argument, Some("KEY"));
        assert_eq!(&text[found[0].start..found[0].end], "${{env.KEY}}");
        assert!(full_match(text).is_none());
    }

    #[test]
    fn test_escaped_outer_with_live_inner() {
        assert_eq!(names(r"\${{a.${{b.c}}}}"), vec![("b", Some("c"))]);
    }

    #[test]
    fn test_invalid_name_character_is_not_a_placeholder() {
        assert!(placeholders("${{foo bar}}").is_empty());
        assert!(placeholders("${{foo:bar}}").is_empty());
    }

    #[test]
    fn test_unterminated_is_not_a_placeholder() {
        assert!(placeholders("${{foo.bar").is_empty());
        assert!(placeholders("${{foo").is_empty());
        assert!(placeholders("${foo}").is_empty());
    }

    #[test]
    fn test_single_brace_inside_argument() {
        let p = full_match("${{pyeval.a}b}}").unwrap();
        assert_eq!(p.argument, Some("a}b"));

        // the first `}}` closes; a trailing brace stays literal
        let found = placeholders("${{var.x}}}");
        assert_eq!(found[0].argument, Some("x"));
        assert_eq!(found[0].end, 10);
    }

    #[test]
    fn test_argument_may_span_lines() {
        let p = full_match("${{pyeval.1 +\n2}}").unwrap();
        assert_eq!(p.argument, Some("1 +\n2"));
    }

    #[test]
    fn test_rejected_outer_match_does_not_hide_later_ones() {
        assert_eq!(
            names(r"\${{a.b}} ${{c.${{d}}}} ${{e}}"),
            vec![("d", None), ("e", None)]
        );
    }

    #[test]
    fn test_unicode_around_placeholder() {
        let text = "héllo ${{var.wörld}} ✓";
        let found = placeholders(text);
        assert_eq!(found.len(), 1);
        assert_eq!(&text[found[0].start..found[0].end], "${{var.wörld}}");
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"cost: \${{var.x}}"), "cost: ${{var.x}}");
        assert!(matches!(unescape("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_contains_placeholder() {
        assert!(contains_placeholder("a ${{b}}"));
        assert!(!contains_placeholder(r"a \${{b}}"));
        assert!(!contains_placeholder("a $ {{b}}"));
    }
}
