//! Octocrab client wrapper scoped to a specific repository.
//!
//! All operations performed through this client target the same repository;
//! the analysis flow resolves the repo once (from a PR URL or explicit
//! owner/repo fields) and then works through a scoped client.

use octocrab::Octocrab;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::github::error::GitHubApiError;
use crate::types::{PrNumber, RepoId, Sha};

/// Page size used when listing PR files.
const FILES_PER_PAGE: usize = 100;

/// The PR metadata the review and analysis flows consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrDetails {
    pub number: PrNumber,
    pub title: String,
    pub body: String,
    /// `"open"` or `"closed"` (GitHub reports merged PRs as closed).
    pub state: String,
    pub author: String,
    pub head_sha: Sha,
    pub head_ref: String,
    pub base_ref: String,
    pub draft: bool,
}

/// One changed file in a PR.
///
/// `patch` is absent for binary files and for very large diffs; callers
/// treat that as zero hunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrFile {
    pub filename: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
    #[serde(default)]
    pub patch: Option<String>,
}

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
    repo: RepoId,
}

impl GitHubClient {
    /// Creates a client authenticated with a personal or installation token.
    pub fn from_token(token: impl Into<String>, repo: RepoId) -> Result<Self, GitHubApiError> {
        let client = Octocrab::builder()
            .personal_token(token.into())
            .build()
            .map_err(GitHubApiError::from_octocrab)?;
        Ok(GitHubClient { client, repo })
    }

    /// Creates an unauthenticated client. Subject to much lower rate limits;
    /// only useful against public repositories.
    pub fn anonymous(repo: RepoId) -> Self {
        GitHubClient {
            client: Octocrab::default(),
            repo,
        }
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Fetches a pull request's metadata.
    pub async fn get_pr(&self, pr: PrNumber) -> Result<PrDetails, GitHubApiError> {
        let pull = self
            .client
            .pulls(&self.repo.owner, &self.repo.repo)
            .get(pr.0)
            .await
            .map_err(GitHubApiError::from_octocrab)?;

        let state = if matches!(pull.state, Some(octocrab::models::IssueState::Closed)) {
            "closed"
        } else {
            "open"
        };

        Ok(PrDetails {
            number: PrNumber(pull.number),
            title: pull.title.unwrap_or_default(),
            body: pull.body.unwrap_or_default(),
            state: state.to_string(),
            author: pull.user.map(|u| u.login).unwrap_or_default(),
            head_sha: Sha::new(pull.head.sha),
            head_ref: pull.head.ref_field,
            base_ref: pull.base.ref_field,
            draft: pull.draft.unwrap_or(false),
        })
    }

    /// Lists the files changed by a pull request, following pagination.
    pub async fn list_pr_files(&self, pr: PrNumber) -> Result<Vec<PrFile>, GitHubApiError> {
        let mut files = Vec::new();
        let mut page = 1u32;

        loop {
            let route = format!(
                "/repos/{}/{}/pulls/{}/files?per_page={}&page={}",
                self.repo.owner, self.repo.repo, pr.0, FILES_PER_PAGE, page
            );
            let batch: Vec<PrFile> = self
                .client
                .get(&route, None::<&()>)
                .await
                .map_err(GitHubApiError::from_octocrab)?;

            let last_page = batch.len() < FILES_PER_PAGE;
            files.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        debug!(pr = %pr, files = files.len(), "fetched PR file list");
        Ok(files)
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}

/// Parses a GitHub PR URL of the form
/// `https://github.com/<owner>/<repo>/pull/<number>`, tolerating a trailing
/// path (`/files`), query string, or fragment.
pub fn parse_pr_url(url: &str) -> Option<(RepoId, PrNumber)> {
    let start = url.find("github.com/")?;
    let path = &url[start + "github.com/".len()..];

    let mut segments = path.split('/');
    let owner = segments.next().filter(|s| !s.is_empty())?;
    let repo = segments.next().filter(|s| !s.is_empty())?;
    if segments.next()? != "pull" {
        return None;
    }
    let number = segments
        .next()?
        .split(['?', '#'])
        .next()?
        .parse::<u64>()
        .ok()?;

    Some((RepoId::new(owner, repo), PrNumber(number)))
}
