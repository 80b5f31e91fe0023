//! Parser for unified-diff patch text.
//!
//! GitHub's PR files API returns each file's changes as a unified-diff
//! `patch` string. This parser turns that text into [`DiffHunk`]s with
//! per-line old/new line numbers so the dashboard can render a two-column
//! diff.
//!
//! Parsing is best-effort and never fails: input without hunk headers yields
//! an empty result, and unrecognized lines inside a hunk (such as the
//! `\ No newline at end of file` marker) are skipped without contributing a
//! line. Binary files have no `patch` at all; callers treat that as zero
//! hunks upstream of this module.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Classification of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Add,
    Remove,
    Context,
}

/// One line within a hunk, with its old/new line numbers.
///
/// `old_number` is present for removed and context lines, `new_number` for
/// added and context lines. `content` excludes the leading marker character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffLineKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_number: Option<u64>,
    pub content: String,
}

/// One `@@ -a,b +c,d @@` region of a unified diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: u64,
    pub old_lines: u64,
    pub new_start: u64,
    pub new_lines: u64,
    pub lines: Vec<DiffLine>,
}

/// Parses unified-diff text into hunks. Never fails.
///
/// A line starting `@@` that parses as a hunk header closes the current hunk
/// and opens a new one; one that doesn't parse is skipped. Lines before the
/// first header contribute nothing. Omitted counts in a header default to 1
/// per unified-diff convention (`@@ -5 +5 @@` spans one line on each side).
pub fn parse_patch(patch: &str) -> Vec<DiffHunk> {
    let mut hunks = Vec::new();
    let mut current: Option<DiffHunk> = None;
    let mut old_line_number = 0u64;
    let mut new_line_number = 0u64;

    for line in patch.split('\n') {
        if line.starts_with("@@") {
            if let Some(header) = parse_hunk_header(line) {
                if let Some(hunk) = current.take() {
                    hunks.push(hunk);
                }
                old_line_number = header.old_start;
                new_line_number = header.new_start;
                current = Some(DiffHunk {
                    old_start: header.old_start,
                    old_lines: header.old_lines,
                    new_start: header.new_start,
                    new_lines: header.new_lines,
                    lines: Vec::new(),
                });
            }
            // A malformed @@ line is skipped; counters stay untouched.
        } else if let Some(hunk) = current.as_mut() {
            if let Some(content) = line.strip_prefix('-') {
                hunk.lines.push(DiffLine {
                    kind: DiffLineKind::Remove,
                    old_number: Some(old_line_number),
                    new_number: None,
                    content: content.to_string(),
                });
                old_line_number += 1;
            } else if let Some(content) = line.strip_prefix('+') {
                hunk.lines.push(DiffLine {
                    kind: DiffLineKind::Add,
                    old_number: None,
                    new_number: Some(new_line_number),
                    content: content.to_string(),
                });
                new_line_number += 1;
            } else if let Some(content) = line.strip_prefix(' ') {
                hunk.lines.push(DiffLine {
                    kind: DiffLineKind::Context,
                    old_number: Some(old_line_number),
                    new_number: Some(new_line_number),
                    content: content.to_string(),
                });
                old_line_number += 1;
                new_line_number += 1;
            }
            // Anything else ("\ No newline at end of file", empty trailing
            // segment) contributes no line.
        }
    }

    if let Some(hunk) = current.take() {
        hunks.push(hunk);
    }

    hunks
}

struct HunkHeader {
    old_start: u64,
    old_lines: u64,
    new_start: u64,
    new_lines: u64,
}

/// Parses `@@ -<old>[,<n>] +<new>[,<n>] @@[ context]`. Returns `None` for
/// anything that doesn't match exactly.
fn parse_hunk_header(line: &str) -> Option<HunkHeader> {
    let rest = line.strip_prefix("@@ -")?;
    let (ranges, _trailing) = rest.split_once(" @@")?;
    let (old, new) = ranges.split_once(" +")?;
    let (old_start, old_lines) = parse_range(old)?;
    let (new_start, new_lines) = parse_range(new)?;
    Some(HunkHeader {
        old_start,
        old_lines,
        new_start,
        new_lines,
    })
}

/// Parses `start[,count]`; a missing count defaults to 1.
fn parse_range(range: &str) -> Option<(u64, u64)> {
    match range.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((range.parse().ok()?, 1)),
    }
}

/// Ensures a diff fragment starts with a hunk header, synthesizing a minimal
/// one when it doesn't.
///
/// Model-produced per-hunk fragments often omit the `@@` header. The parser
/// does not infer missing headers, so callers prepend `@@ -1,N +1,N @@`
/// where N is the larger of the counted added/removed lines (minimum 1). A
/// fragment whose first line already parses as a header passes through
/// unchanged.
pub fn ensure_hunk_header(fragment: &str) -> Cow<'_, str> {
    let first_line = fragment.split('\n').next().unwrap_or("");
    if first_line.starts_with("@@") && parse_hunk_header(first_line).is_some() {
        return Cow::Borrowed(fragment);
    }

    let adds = fragment
        .split('\n')
        .filter(|line| line.starts_with('+'))
        .count() as u64;
    let removes = fragment
        .split('\n')
        .filter(|line| line.starts_with('-'))
        .count() as u64;
    let span = adds.max(removes).max(1);

    Cow::Owned(format!("@@ -1,{span} +1,{span} @@\n{fragment}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_input_yields_no_hunks() {
        assert!(parse_patch("").is_empty());
    }

    #[test]
    fn input_without_headers_yields_no_hunks() {
        assert!(parse_patch("just some text\n+not a hunk\n-because no header").is_empty());
    }

    #[test]
    fn single_hunk_with_all_line_kinds() {
        let patch = "@@ -1,3 +1,3 @@\n context before\n-removed\n+added\n";
        let hunks = parse_patch(patch);

        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 1);
        assert_eq!(hunk.old_lines, 3);
        assert_eq!(hunk.new_start, 1);
        assert_eq!(hunk.new_lines, 3);
        assert_eq!(hunk.lines.len(), 3);

        assert_eq!(hunk.lines[0].kind, DiffLineKind::Context);
        assert_eq!(hunk.lines[0].content, "context before");
        assert_eq!(hunk.lines[0].old_number, Some(1));
        assert_eq!(hunk.lines[0].new_number, Some(1));

        assert_eq!(hunk.lines[1].kind, DiffLineKind::Remove);
        assert_eq!(hunk.lines[1].old_number, Some(2));
        assert_eq!(hunk.lines[1].new_number, None);

        assert_eq!(hunk.lines[2].kind, DiffLineKind::Add);
        assert_eq!(hunk.lines[2].old_number, None);
        assert_eq!(hunk.lines[2].new_number, Some(2));
    }

    #[test]
    fn header_counts_default_to_one() {
        let hunks = parse_patch("@@ -5 +5 @@\n line");

        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 5);
        assert_eq!(hunk.old_lines, 1);
        assert_eq!(hunk.new_start, 5);
        assert_eq!(hunk.new_lines, 1);
        assert_eq!(hunk.lines.len(), 1);
        assert_eq!(hunk.lines[0].kind, DiffLineKind::Context);
        assert_eq!(hunk.lines[0].old_number, Some(5));
        assert_eq!(hunk.lines[0].new_number, Some(5));
    }

    #[test]
    fn line_counters_advance_per_kind() {
        let hunks = parse_patch("@@ -1,2 +1,3 @@\n-a\n+b\n+c\n d");

        assert_eq!(hunks.len(), 1);
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 4);

        assert_eq!(lines[0].kind, DiffLineKind::Remove);
        assert_eq!(lines[0].old_number, Some(1));

        assert_eq!(lines[1].kind, DiffLineKind::Add);
        assert_eq!(lines[1].new_number, Some(1));

        assert_eq!(lines[2].kind, DiffLineKind::Add);
        assert_eq!(lines[2].new_number, Some(2));

        assert_eq!(lines[3].kind, DiffLineKind::Context);
        assert_eq!(lines[3].old_number, Some(2));
        assert_eq!(lines[3].new_number, Some(3));
    }

    #[test]
    fn multiple_hunks() {
        let patch = "@@ -1,1 +1,1 @@\n-old\n+new\n@@ -10,2 +10,2 @@\n context\n-x\n+y";
        let hunks = parse_patch(patch);

        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(hunks[1].old_start, 10);
        assert_eq!(hunks[1].lines[0].old_number, Some(10));
        assert_eq!(hunks[1].lines[1].old_number, Some(11));
        assert_eq!(hunks[1].lines[2].new_number, Some(11));
    }

    #[test]
    fn header_with_trailing_context_parses() {
        // git appends the enclosing function after the closing @@
        let hunks = parse_patch("@@ -4,6 +4,7 @@ fn main() {\n line");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 4);
        assert_eq!(hunks[0].new_lines, 7);
    }

    #[test]
    fn malformed_header_is_skipped() {
        // Starts with @@ but doesn't parse; no hunk opens, so the following
        // lines contribute nothing either.
        let hunks = parse_patch("@@ not a header @@\n+ignored");
        assert!(hunks.is_empty());
    }

    #[test]
    fn malformed_header_inside_hunk_does_not_disturb_counters() {
        let patch = "@@ -1,2 +1,2 @@\n-a\n@@ garbage\n+b";
        let hunks = parse_patch(patch);

        assert_eq!(hunks.len(), 1);
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].old_number, Some(1));
        assert_eq!(lines[1].new_number, Some(1));
    }

    #[test]
    fn no_newline_marker_is_skipped() {
        let patch = "@@ -1,1 +1,1 @@\n-old\n\\ No newline at end of file\n+new";
        let hunks = parse_patch(patch);

        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!(hunks[0].lines[0].kind, DiffLineKind::Remove);
        assert_eq!(hunks[0].lines[1].kind, DiffLineKind::Add);
    }

    #[test]
    fn trailing_newline_tolerated() {
        let hunks = parse_patch("@@ -1,1 +1,1 @@\n-a\n+b\n");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 2);
    }

    #[test]
    fn marker_is_stripped_from_content() {
        let hunks = parse_patch("@@ -1,1 +1,1 @@\n-  indented\n+\tother");
        let lines = &hunks[0].lines;
        assert_eq!(lines[0].content, "  indented");
        assert_eq!(lines[1].content, "\tother");
    }

    #[test]
    fn content_before_first_header_is_ignored() {
        let patch = "diff --git a/f b/f\nindex 123..456\n--- a/f\n+++ b/f\n@@ -1,1 +1,1 @@\n-a\n+b";
        let hunks = parse_patch(patch);

        // The ---/+++ file header lines precede the first @@ and must not be
        // classified as remove/add lines.
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 2);
    }

    #[test]
    fn diff_line_serializes_type_field() {
        let hunks = parse_patch("@@ -1,1 +1,1 @@\n-a");
        let value = serde_json::to_value(&hunks[0].lines[0]).unwrap();
        assert_eq!(value["type"], "remove");
        assert_eq!(value["old_number"], 1);
        assert!(value.get("new_number").is_none());
    }

    #[test]
    fn ensure_hunk_header_passes_through_headed_fragment() {
        let fragment = "@@ -3,2 +3,2 @@\n-a\n+b";
        let ensured = ensure_hunk_header(fragment);
        assert!(matches!(ensured, Cow::Borrowed(_)));
        assert_eq!(ensured.as_ref(), fragment);
    }

    #[test]
    fn ensure_hunk_header_synthesizes_for_headerless_fragment() {
        let fragment = "-a\n+b\n+c";
        let ensured = ensure_hunk_header(fragment);

        assert_eq!(ensured.as_ref(), "@@ -1,3 +1,3 @@\n-a\n+b\n+c");
        let hunks = parse_patch(&ensured);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 3);
    }

    #[test]
    fn ensure_hunk_header_minimum_span_is_one() {
        let ensured = ensure_hunk_header(" just context");
        assert!(ensured.starts_with("@@ -1,1 +1,1 @@\n"));
    }

    #[test]
    fn ensure_hunk_header_rejects_malformed_at_line() {
        // Starts with @@ but isn't a valid header, so a real one is prepended.
        let ensured = ensure_hunk_header("@@ bogus\n+x");
        assert!(ensured.starts_with("@@ -1,1 +1,1 @@\n@@ bogus"));
    }

    proptest! {
        /// The parser never panics, whatever the input.
        #[test]
        fn parse_never_panics(input in ".{0,500}") {
            let _ = parse_patch(&input);
        }

        /// Counters always advance monotonically within a hunk.
        #[test]
        fn counters_monotonic(input in "(@@ -[0-9]{1,3},[0-9] \\+[0-9]{1,3},[0-9] @@\n)?([-+ ].{0,10}\n){0,20}") {
            for hunk in parse_patch(&input) {
                let mut last_old = 0;
                let mut last_new = 0;
                for line in &hunk.lines {
                    if let Some(old) = line.old_number {
                        prop_assert!(old >= last_old);
                        last_old = old;
                    }
                    if let Some(new) = line.new_number {
                        prop_assert!(new >= last_new);
                        last_new = new;
                    }
                }
            }
        }

        /// ensure_hunk_header output always parses to at least one hunk when
        /// the fragment has any classifiable line.
        #[test]
        fn ensured_fragment_parses(fragment in "[-+ ][a-z]{0,10}(\n[-+ ][a-z]{0,10}){0,5}") {
            let ensured = ensure_hunk_header(&fragment);
            let hunks = parse_patch(&ensured);
            prop_assert_eq!(hunks.len(), 1);
            prop_assert!(!hunks[0].lines.is_empty());
        }
    }
}
