//! Parsing and shape validation of the extracted analysis document.
//!
//! The provider may answer in YAML or JSON; serde_yaml accepts both since
//! JSON is a YAML subset, so one parse path covers them. Validation is
//! strict: a document missing `summary` or `changes` is an error carrying
//! the raw candidate text, never a silently defaulted result. The caller
//! surfaces that raw text so a human can diagnose prompt or format drift.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::extract::extract_document;

/// A validated analysis of a pull request's changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Brief summary of the changes in the PR.
    pub summary: String,

    /// Logical change groups, each spanning one or more diff hunks.
    pub changes: Vec<ChangeGroup>,
}

/// One logical change, possibly cutting across files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeGroup {
    /// Human-readable label for the change.
    pub label: String,

    /// The diff hunks belonging to this change.
    #[serde(default)]
    pub hunks: Vec<ChangeHunk>,
}

/// A diff fragment attributed to a file.
///
/// The `diff` text may lack a hunk header; rendering goes through
/// [`crate::diff::ensure_hunk_header`] before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeHunk {
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub diff: String,
}

/// Failure to reconcile model output into an [`AnalysisResult`].
///
/// Both variants carry the candidate text that was parsed so callers can
/// show it verbatim; users need to tell "the model said something
/// unparseable" apart from "the request failed".
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The candidate document is neither valid YAML nor valid JSON.
    #[error("model output is not valid YAML or JSON: {source}")]
    Syntax {
        source: serde_yaml::Error,
        raw: String,
    },

    /// The document parsed but violates the required shape.
    #[error("model output has the wrong shape: {reason}")]
    Validation { reason: String, raw: String },
}

impl ReconcileError {
    /// The raw candidate text that failed to reconcile.
    pub fn raw(&self) -> &str {
        match self {
            ReconcileError::Syntax { raw, .. } => raw,
            ReconcileError::Validation { raw, .. } => raw,
        }
    }
}

/// Reconciles raw model output into a validated [`AnalysisResult`].
///
/// Pure and deterministic: the same input always yields the same result.
///
/// # Errors
///
/// Returns `ReconcileError::Syntax` when the extracted candidate is not
/// parseable, and `ReconcileError::Validation` when it parses but `summary`
/// is missing/empty or `changes` is not a list.
pub fn reconcile(raw_output: &str) -> Result<AnalysisResult, ReconcileError> {
    let candidate = extract_document(raw_output);

    let value: serde_yaml::Value =
        serde_yaml::from_str(candidate).map_err(|source| ReconcileError::Syntax {
            source,
            raw: candidate.to_string(),
        })?;

    validate_shape(&value, candidate)?;

    serde_yaml::from_value(value).map_err(|e| ReconcileError::Validation {
        reason: e.to_string(),
        raw: candidate.to_string(),
    })
}

/// Checks the top-level invariants before deserializing: `summary` must be a
/// non-empty string and `changes` must be a list. Reported individually so
/// the error says which one the model got wrong.
fn validate_shape(value: &serde_yaml::Value, candidate: &str) -> Result<(), ReconcileError> {
    let validation = |reason: &str| ReconcileError::Validation {
        reason: reason.to_string(),
        raw: candidate.to_string(),
    };

    let mapping = value.as_mapping().ok_or_else(|| {
        validation("document is not a mapping")
    })?;

    match mapping.get("summary") {
        Some(serde_yaml::Value::String(s)) if !s.is_empty() => {}
        Some(serde_yaml::Value::String(_)) => {
            return Err(validation("`summary` is empty"));
        }
        Some(_) => return Err(validation("`summary` is not a string")),
        None => return Err(validation("missing `summary`")),
    }

    match mapping.get("changes") {
        Some(serde_yaml::Value::Sequence(_)) => {}
        Some(_) => return Err(validation("`changes` is not a list")),
        None => return Err(validation("missing `changes`")),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fenced_yaml_with_prose_around_it() {
        let input = "prelude text ```yaml\nsummary: x\nchanges: []\n``` trailing";
        let result = reconcile(input).unwrap();

        assert_eq!(result.summary, "x");
        assert!(result.changes.is_empty());
    }

    #[test]
    fn bare_yaml_document() {
        let result = reconcile("summary: refactored auth\nchanges: []").unwrap();
        assert_eq!(result.summary, "refactored auth");
    }

    #[test]
    fn json_is_accepted() {
        let input = r#"{"summary": "x", "changes": [{"label": "auth", "hunks": [{"file": "a.rs", "diff": "-a\n+b"}]}]}"#;
        let result = reconcile(input).unwrap();

        assert_eq!(result.summary, "x");
        assert_eq!(result.changes.len(), 1);
        assert_eq!(result.changes[0].label, "auth");
        assert_eq!(result.changes[0].hunks[0].file, "a.rs");
        assert_eq!(result.changes[0].hunks[0].diff, "-a\n+b");
    }

    #[test]
    fn fenced_json_with_language_tag() {
        let input = "```json\n{\"summary\": \"x\", \"changes\": []}\n```";
        assert_eq!(reconcile(input).unwrap().summary, "x");
    }

    #[test]
    fn truncated_fence_still_reconciles_when_document_complete() {
        // The fence never closed but the document inside is whole.
        let input = "```yaml\nsummary: x\nchanges: []";
        let result = reconcile(input).unwrap();
        assert_eq!(result.summary, "x");
    }

    #[test]
    fn missing_changes_is_validation_error_with_raw() {
        let err = reconcile("summary: only this").unwrap_err();
        match &err {
            ReconcileError::Validation { reason, raw } => {
                assert!(reason.contains("changes"), "reason: {}", reason);
                assert_eq!(raw, "summary: only this");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(err.raw(), "summary: only this");
    }

    #[test]
    fn missing_summary_is_validation_error() {
        let err = reconcile("changes: []").unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { .. }));
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn empty_summary_is_validation_error() {
        let err = reconcile("summary: \"\"\nchanges: []").unwrap_err();
        match err {
            ReconcileError::Validation { reason, .. } => assert!(reason.contains("empty")),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_string_summary_is_validation_error() {
        let err = reconcile("summary: 42\nchanges: []").unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { .. }));
    }

    #[test]
    fn non_list_changes_is_validation_error() {
        let err = reconcile("summary: x\nchanges: nope").unwrap_err();
        match err {
            ReconcileError::Validation { reason, .. } => {
                assert!(reason.contains("not a list"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn non_mapping_document_is_validation_error() {
        let err = reconcile("- just\n- a\n- list").unwrap_err();
        assert!(matches!(err, ReconcileError::Validation { .. }));
    }

    #[test]
    fn unparseable_candidate_is_syntax_error_with_raw() {
        let input = "```json\n{\"summary\": \"cut off";
        let err = reconcile(input).unwrap_err();
        match &err {
            ReconcileError::Syntax { raw, .. } => {
                assert_eq!(raw, "{\"summary\": \"cut off");
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn change_group_hunks_default_to_empty() {
        let result = reconcile("summary: x\nchanges:\n  - label: only a label").unwrap();
        assert_eq!(result.changes.len(), 1);
        assert!(result.changes[0].hunks.is_empty());
    }

    #[test]
    fn analysis_result_json_roundtrip() {
        let result = reconcile(r#"{"summary": "x", "changes": [{"label": "l", "hunks": []}]}"#)
            .unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: AnalysisResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, parsed);
    }

    proptest! {
        /// Reconciliation is idempotent: same input, same outcome.
        #[test]
        fn reconcile_deterministic(input in ".{0,200}") {
            let a = reconcile(&input);
            let b = reconcile(&input);
            match (a, b) {
                (Ok(x), Ok(y)) => prop_assert_eq!(x, y),
                (Err(x), Err(y)) => prop_assert_eq!(x.raw(), y.raw()),
                _ => prop_assert!(false, "non-deterministic outcome"),
            }
        }

        /// Any well-formed summary/changes pair reconciles.
        #[test]
        fn well_formed_documents_reconcile(summary in "[a-zA-Z][a-zA-Z0-9 ]{0,40}") {
            let input = format!("summary: {}\nchanges: []", summary);
            let result = reconcile(&input).unwrap();
            prop_assert_eq!(result.summary, summary.trim());
        }

        /// Errors always carry the candidate text.
        #[test]
        fn errors_carry_raw(input in "changes: [a-z]{1,10}") {
            let err = reconcile(&input).unwrap_err();
            prop_assert!(!err.raw().is_empty());
        }
    }
}
