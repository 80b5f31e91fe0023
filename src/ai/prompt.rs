//! Prompt construction for PR analysis.

/// Maximum number of diff lines included in a prompt. Anything beyond this
/// is truncated before the prompt is built.
pub const MAX_DIFF_LINES: usize = 50_000;

/// Default `max_tokens` for analysis requests.
pub const DEFAULT_MAX_TOKENS: u32 = 64_000;

/// System prompt framing the reviewer role.
pub const SYSTEM_PROMPT: &str = "You are an expert code reviewer. You analyze pull request diffs \
and reorganize them into logical changes, responding only with the requested structured document.";

/// Builds the analysis prompt from the PR description, the changed file
/// list, and the (already line-limited) concatenated diff text.
///
/// The output asks for a JSON object `{summary, changes: [{label, hunks:
/// [{file, diff}]}]}`; the reconciler tolerates YAML as well, so format
/// drift in the answer is survivable.
pub fn build_analysis_prompt(
    pr_description: &str,
    changed_files: &[String],
    file_changes: &str,
) -> String {
    format!(
        r#"You are an expert code reviewer analyzing a GitHub pull request.
Your goal is to re-organize the changes in the pull request so that logical changes are together regardless of which
file they occurred in.

## PR Description
{pr_description}

## Files Changed
{files}

## Code Changes
```
{file_changes}
```

Your analysis should be thorough but concise, focusing on the most important aspects of the code changes.
All hunks in the file changes should be included in the output.
Based on the above information, please output only a JSON object with the following structure:
```json
{{
  "summary": "A brief summary of the changes made in the PR",
  "changes": [
    {{"label": "Key point 1 about the changes", "hunks": [{{"file": "path/to/file", "diff": "RELEVANT_HUNK_IN_DIFF_FORMAT"}}]}},
    {{"label": "Key point 2 about the changes", "hunks": [{{"file": "path/to/file", "diff": "RELEVANT_HUNK_IN_DIFF_FORMAT"}}]}}
  ]
}}
```
"#,
        files = changed_files.join("\n"),
    )
}

/// Truncates text to at most `max` lines.
pub fn limit_lines(text: &str, max: usize) -> String {
    text.split('\n').take(max).collect::<Vec<_>>().join("\n")
}
