//! Normalized webhook event types.
//!
//! GitHub delivers each event family with its own payload shape. The
//! normalizer flattens the families the dashboard cares about into a single
//! [`NormalizedEvent`] record so the store and the HTTP API can treat them
//! uniformly. The serialized field names here are the dashboard's wire
//! contract; changing them breaks consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{CommentId, DeliveryId, InstallationId, PrNumber, Sha};

/// The normalized kind of a webhook event.
///
/// Note the comment split: conversation-tab comments arrive as `issue_comment`
/// deliveries whether or not the issue is a PR, and the normalizer tells them
/// apart by the `issue.pull_request` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A pull request lifecycle event.
    PullRequest,
    /// An issue lifecycle event.
    Issue,
    /// A comment on a plain issue.
    IssueComment,
    /// A comment on the conversation tab of a pull request.
    PullRequestComment,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::PullRequest => "pull_request",
            EventKind::Issue => "issue",
            EventKind::IssueComment => "issue_comment",
            EventKind::PullRequestComment => "pull_request_comment",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository identification carried on every normalized event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    /// The short repository name (e.g., "pr-focus").
    pub name: String,

    /// The full "owner/repo" name. Event queries filter on this.
    pub full_name: String,

    /// The owner's login.
    pub owner: String,
}

/// The user (or bot) that triggered the event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorInfo {
    /// The sender's login.
    pub login: String,

    /// GitHub's account type string ("User", "Bot", "Organization").
    #[serde(rename = "type")]
    pub kind: String,
}

/// Kind-specific payload of a normalized event.
///
/// Serialized untagged: the variants never share a full field set, so the
/// field names alone distinguish them on the wire (`pr_number` vs
/// `comment_id` vs `assignees`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventData {
    PullRequest(PullRequestData),
    Comment(CommentData),
    Issue(IssueData),
}

/// Payload for `pull_request` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestData {
    pub pr_number: PrNumber,
    pub pr_title: String,
    pub pr_state: String,
    pub pr_author: String,
    pub head_sha: Sha,
    pub base_ref: String,
    pub requested_reviewers: Vec<String>,
}

/// Payload for `issues` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueData {
    pub issue_number: u64,
    pub issue_title: String,
    pub issue_state: String,
    pub issue_author: String,
    pub assignees: Vec<String>,
}

/// Payload for `issue_comment` events (on issues and on PRs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentData {
    pub issue_number: u64,
    pub issue_title: String,
    pub comment_id: CommentId,
    pub comment_author: String,

    /// First 100 characters of the comment body.
    pub comment_body_preview: String,

    /// True when the comment sits on a pull request's conversation tab.
    pub is_pr_comment: bool,
}

/// A webhook delivery normalized to the dashboard's single event shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// The delivery ID from the `x-github-delivery` header, or a synthesized
    /// fallback when the header was absent.
    pub id: DeliveryId,

    /// The normalized event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// The payload's action string, verbatim (may be empty).
    pub action: String,

    /// When this service normalized the delivery (not GitHub's send time).
    pub timestamp: DateTime<Utc>,

    /// The repository the event belongs to.
    pub repository: RepositoryInfo,

    /// Who triggered the event.
    pub actor: ActorInfo,

    /// Kind-specific fields.
    pub data: EventData,

    /// The GitHub App installation, when delivered through one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<InstallationId>,
}
