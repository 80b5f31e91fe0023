//! Candidate document extraction from raw model output.
//!
//! Models wrap their answer unpredictably: sometimes a fenced code block,
//! sometimes YAML front-matter markers, sometimes nothing at all. Streamed
//! responses can also be cut off mid-document, leaving an opening fence with
//! no close. Extraction is therefore ordered and forgiving; it only narrows
//! the text, it never fails.

/// Extracts the candidate document from raw model output.
///
/// Attempts, first match wins:
/// 1. a fenced code block (optional language tag); the content runs to the
///    closing fence, or to end of input when the stream was truncated before
///    the fence closed;
/// 2. the content between the first two `---` markers on their own lines;
/// 3. the whole input.
pub fn extract_document(input: &str) -> &str {
    if let Some(inner) = extract_fenced(input) {
        return inner;
    }
    if let Some(inner) = extract_between_markers(input) {
        return inner;
    }
    input
}

/// Finds a triple-backtick fenced block. The rest of the opening fence line
/// is treated as a language tag and skipped.
fn extract_fenced(input: &str) -> Option<&str> {
    let open = input.find("```")?;
    let rest = &input[open + 3..];

    let body = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains("```") => &rest[newline + 1..],
        // Single-line fence or no newline after the opening fence: take the
        // rest verbatim rather than guessing at a tag.
        _ => rest,
    };

    match body.find("```") {
        Some(close) => Some(&body[..close]),
        // Truncated stream: the fence never closed, take everything.
        None => Some(body),
    }
}

/// Finds content between two `---` document markers, each on its own line.
fn extract_between_markers(input: &str) -> Option<&str> {
    let mut offset = 0;
    let mut content_start: Option<usize> = None;

    for line in input.split_inclusive('\n') {
        if line.trim() == "---" {
            match content_start {
                None => content_start = Some(offset + line.len()),
                Some(start) => return Some(&input[start..offset]),
            }
        }
        offset += line.len();
    }

    // A lone marker is not a delimited document.
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fenced_block_with_language_tag() {
        let input = "prelude text ```yaml\nsummary: x\nchanges: []\n``` trailing";
        assert_eq!(extract_document(input), "summary: x\nchanges: []\n");
    }

    #[test]
    fn fenced_block_without_language_tag() {
        let input = "```\n{\"summary\": \"x\"}\n```";
        assert_eq!(extract_document(input), "{\"summary\": \"x\"}\n");
    }

    #[test]
    fn truncated_fence_extracts_to_end() {
        // Stream cut off before the closing fence arrived.
        let input = "Here is my analysis:\n```json\n{\"summary\": \"partial";
        assert_eq!(extract_document(input), "{\"summary\": \"partial");
    }

    #[test]
    fn fence_at_very_end_of_input() {
        assert_eq!(extract_document("text ```"), "");
    }

    #[test]
    fn front_matter_markers() {
        let input = "intro\n---\nsummary: x\nchanges: []\n---\noutro";
        assert_eq!(extract_document(input), "summary: x\nchanges: []\n");
    }

    #[test]
    fn fence_wins_over_markers() {
        let input = "---\nnot this\n---\n```yaml\nsummary: x\n```";
        assert_eq!(extract_document(input), "summary: x\n");
    }

    #[test]
    fn lone_marker_falls_through_to_whole_input() {
        let input = "---\nsummary: x";
        assert_eq!(extract_document(input), input);
    }

    #[test]
    fn marker_must_be_on_its_own_line() {
        let input = "a --- b\nsummary: x\nc --- d";
        assert_eq!(extract_document(input), input);
    }

    #[test]
    fn no_wrapping_returns_whole_input() {
        let input = "summary: x\nchanges: []";
        assert_eq!(extract_document(input), input);
    }

    #[test]
    fn empty_input() {
        assert_eq!(extract_document(""), "");
    }

    #[test]
    fn marker_with_surrounding_whitespace_counts() {
        let input = "  ---  \nsummary: x\n---\n";
        assert_eq!(extract_document(input), "summary: x\n");
    }

    proptest! {
        /// Extraction never panics and always returns a slice of the input.
        #[test]
        fn extraction_is_a_substring(input in ".{0,300}") {
            let extracted = extract_document(&input);
            prop_assert!(input.contains(extracted));
        }

        /// Extraction is deterministic.
        #[test]
        fn extraction_is_deterministic(input in ".{0,300}") {
            prop_assert_eq!(extract_document(&input), extract_document(&input));
        }

        /// Whatever surrounds a well-formed fenced block, its content is
        /// recovered exactly.
        #[test]
        fn fenced_content_recovered(
            prelude in "[^`]{0,50}",
            content in "[^`]{0,80}",
            trailing in "[^`]{0,50}"
        ) {
            let input = format!("{prelude}```yaml\n{content}```{trailing}");
            prop_assert_eq!(extract_document(&input), content.as_str());
        }
    }
}
