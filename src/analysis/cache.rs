//! Per-commit cache of reconciled analysis results.
//!
//! Analyses are keyed by the PR's head commit SHA, not its number: the same
//! PR can be re-analyzed after a new push, while an unchanged commit never
//! needs the model invoked twice. Entries are stored as JSON strings under
//! the key `pr-analysis-<head_sha>`; a corrupt entry is treated as a cache
//! miss and evicted, never as an error.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::analysis::reconcile::{reconcile, AnalysisResult, ReconcileError};
use crate::types::Sha;

/// Builds the cache key for a head commit.
pub fn cache_key(head_sha: &Sha) -> String {
    format!("pr-analysis-{}", head_sha)
}

/// In-memory cache of JSON-serialized [`AnalysisResult`]s keyed by head SHA.
#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: Mutex<HashMap<String, String>>,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the cached analysis for a head commit.
    ///
    /// A stored entry that no longer deserializes counts as a miss and is
    /// evicted so the next store can replace it.
    pub fn get(&self, head_sha: &Sha) -> Option<AnalysisResult> {
        let key = cache_key(head_sha);
        let mut entries = self.entries.lock().expect("analysis cache lock poisoned");
        let entry = entries.get(&key)?;

        match serde_json::from_str(entry) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(key = %key, error = %e, "evicting corrupt analysis cache entry");
                entries.remove(&key);
                None
            }
        }
    }

    /// Stores an analysis for a head commit, replacing any previous entry.
    pub fn store(&self, head_sha: &Sha, result: &AnalysisResult) {
        let key = cache_key(head_sha);
        // AnalysisResult contains only strings and vectors; serialization
        // cannot fail.
        let json = serde_json::to_string(result).expect("AnalysisResult serializes");
        let mut entries = self.entries.lock().expect("analysis cache lock poisoned");
        entries.insert(key, json);
    }

    /// Caching decorator around [`reconcile`].
    ///
    /// On a hit the raw output is ignored entirely and the cached result is
    /// returned; on a miss the output is reconciled and stored on success.
    /// The boolean is true when the result came from the cache.
    pub fn reconcile_cached(
        &self,
        head_sha: &Sha,
        raw_output: &str,
    ) -> Result<(AnalysisResult, bool), ReconcileError> {
        if let Some(hit) = self.get(head_sha) {
            debug!(head_sha = %head_sha.short(), "analysis cache hit");
            return Ok((hit, true));
        }

        let result = reconcile(raw_output)?;
        self.store(head_sha, &result);
        Ok((result, false))
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("analysis cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
