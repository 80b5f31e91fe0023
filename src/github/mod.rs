//! GitHub API access for PR metadata and file diffs.
//!
//! This module wraps octocrab with the two calls the analysis flow needs
//! (PR details and the changed-file list with patches) and categorizes API
//! failures as transient or permanent so callers can decide whether a retry
//! is worthwhile.

mod client;
mod error;

pub use client::{parse_pr_url, GitHubClient, PrDetails, PrFile};
pub use error::{GitHubApiError, GitHubErrorKind};
