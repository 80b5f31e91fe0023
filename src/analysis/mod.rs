//! Reconciliation of model output into a validated analysis document.
//!
//! The AI provider returns free-form text that usually, but not always,
//! contains a YAML or JSON document describing the reorganized PR changes.
//! This module extracts the candidate document ([`extract`]), parses and
//! validates it ([`reconcile`]), and caches successful results per head
//! commit SHA ([`cache`]).

pub mod cache;
pub mod extract;
pub mod reconcile;

pub use cache::AnalysisCache;
pub use extract::extract_document;
pub use reconcile::{reconcile, AnalysisResult, ChangeGroup, ChangeHunk, ReconcileError};
