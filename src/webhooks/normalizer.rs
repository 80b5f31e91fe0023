//! Webhook payload normalization.
//!
//! Turns raw GitHub webhook JSON into [`NormalizedEvent`]s. Only the event
//! families the dashboard tracks produce an event; everything else (ping,
//! reviews, pushes, stars) normalizes to `None` and is acknowledged upstream
//! without being stored.
//!
//! Deserialization is deliberately permissive. Payload shapes evolve and test
//! fixtures are sparse, so every leaf falls back to a default (empty string,
//! zero, empty list). Only the objects an event cannot exist without (the
//! pull request / issue / comment itself, the repository, and the sender) are
//! required; a payload missing one of those is a [`NormalizeError`].

use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::types::{CommentId, DeliveryId, InstallationId, PrNumber, Sha};
use crate::webhooks::events::{
    ActorInfo, CommentData, EventData, EventKind, IssueData, NormalizedEvent, PullRequestData,
    RepositoryInfo,
};

/// Maximum characters of a comment body carried in the normalized preview.
const COMMENT_PREVIEW_CHARS: usize = 100;

/// Error normalizing a webhook payload.
///
/// Raised only when the payload lacks the object its event type is about;
/// sparse leaves degrade to defaults instead.
#[derive(Debug, Error)]
#[error("malformed {event_type} payload: {source}")]
pub struct NormalizeError {
    event_type: &'static str,
    #[source]
    source: serde_json::Error,
}

/// Normalizes one webhook delivery.
///
/// `event_type` is the `x-github-event` header value and `delivery_id` the
/// optional `x-github-delivery` header. Returns `Ok(None)` for event types
/// the dashboard does not track.
pub fn normalize(
    event_type: &str,
    payload: &serde_json::Value,
    delivery_id: Option<&str>,
) -> Result<Option<NormalizedEvent>, NormalizeError> {
    let id = match delivery_id {
        Some(id) => DeliveryId::new(id),
        None => fallback_delivery_id(),
    };

    match event_type {
        "pull_request" => normalize_pull_request(payload, id).map(Some),
        "issues" => normalize_issue(payload, id).map(Some),
        "issue_comment" => normalize_comment(payload, id).map(Some),
        _ => {
            // Includes ping, review, and review-comment deliveries
            debug!(event_type, "event type not tracked, skipping");
            Ok(None)
        }
    }
}

fn normalize_pull_request(
    payload: &serde_json::Value,
    id: DeliveryId,
) -> Result<NormalizedEvent, NormalizeError> {
    let raw = RawPullRequestPayload::deserialize(payload).map_err(|source| NormalizeError {
        event_type: "pull_request",
        source,
    })?;
    let pr = raw.pull_request;

    Ok(NormalizedEvent {
        id,
        kind: EventKind::PullRequest,
        action: raw.action,
        timestamp: Utc::now(),
        repository: raw.repository.into(),
        actor: raw.sender.into(),
        data: EventData::PullRequest(PullRequestData {
            pr_number: PrNumber(pr.number),
            pr_title: pr.title,
            pr_state: pr.state,
            pr_author: pr.user.login,
            head_sha: Sha::new(pr.head.sha),
            base_ref: pr.base.ref_name,
            requested_reviewers: pr
                .requested_reviewers
                .into_iter()
                .map(|user| user.login)
                .collect(),
        }),
        installation_id: raw.installation.map(|i| InstallationId(i.id)),
    })
}

fn normalize_issue(
    payload: &serde_json::Value,
    id: DeliveryId,
) -> Result<NormalizedEvent, NormalizeError> {
    let raw = RawIssuesPayload::deserialize(payload).map_err(|source| NormalizeError {
        event_type: "issues",
        source,
    })?;
    let issue = raw.issue;

    Ok(NormalizedEvent {
        id,
        kind: EventKind::Issue,
        action: raw.action,
        timestamp: Utc::now(),
        repository: raw.repository.into(),
        actor: raw.sender.into(),
        data: EventData::Issue(IssueData {
            issue_number: issue.number,
            issue_title: issue.title,
            issue_state: issue.state,
            issue_author: issue.user.login,
            assignees: issue.assignees.into_iter().map(|user| user.login).collect(),
        }),
        installation_id: raw.installation.map(|i| InstallationId(i.id)),
    })
}

fn normalize_comment(
    payload: &serde_json::Value,
    id: DeliveryId,
) -> Result<NormalizedEvent, NormalizeError> {
    let raw = RawIssueCommentPayload::deserialize(payload).map_err(|source| NormalizeError {
        event_type: "issue_comment",
        source,
    })?;

    // Conversation-tab comments on PRs arrive as issue_comment deliveries;
    // the issue carries a pull_request marker object when it's really a PR.
    let is_pr_comment = raw.issue.pull_request.is_some();
    let kind = if is_pr_comment {
        EventKind::PullRequestComment
    } else {
        EventKind::IssueComment
    };

    Ok(NormalizedEvent {
        id,
        kind,
        action: raw.action,
        timestamp: Utc::now(),
        repository: raw.repository.into(),
        actor: raw.sender.into(),
        data: EventData::Comment(CommentData {
            issue_number: raw.issue.number,
            issue_title: raw.issue.title,
            comment_id: CommentId(raw.comment.id),
            comment_author: raw.comment.user.login,
            comment_body_preview: comment_preview(&raw.comment.body),
            is_pr_comment,
        }),
        installation_id: raw.installation.map(|i| InstallationId(i.id)),
    })
}

/// Truncates a comment body to the preview length, on a character boundary.
fn comment_preview(body: &str) -> String {
    body.chars().take(COMMENT_PREVIEW_CHARS).collect()
}

/// Synthesizes a delivery ID when the `x-github-delivery` header is missing:
/// epoch milliseconds plus up to nine base36 characters of randomness.
///
/// Two deliveries in the same millisecond can collide if the suffixes also
/// match; accepted, since the ID is diagnostic rather than a dedupe key.
fn fallback_delivery_id() -> DeliveryId {
    let millis = Utc::now().timestamp_millis();
    let suffix = to_base36(rand::random::<u64>());
    let suffix = &suffix[..suffix.len().min(9)];
    DeliveryId::new(format!("{}-{}", millis, suffix))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while n > 0 {
        out.insert(0, DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    out
}

// ============================================================================
// Raw payload structs
//
// These mirror just the slice of GitHub's payloads we read. Leaves default
// rather than erroring so that sparse payloads normalize instead of failing.
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    #[serde(default)]
    login: String,
    #[serde(default, rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct RawRepository {
    #[serde(default)]
    name: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    owner: RawUser,
}

impl From<RawRepository> for RepositoryInfo {
    fn from(raw: RawRepository) -> Self {
        RepositoryInfo {
            name: raw.name,
            full_name: raw.full_name,
            owner: raw.owner.login,
        }
    }
}

impl From<RawUser> for ActorInfo {
    fn from(raw: RawUser) -> Self {
        ActorInfo {
            login: raw.login,
            kind: raw.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawInstallation {
    #[serde(default)]
    id: u64,
}

#[derive(Debug, Default, Deserialize)]
struct RawGitRef {
    #[serde(default)]
    sha: String,
    #[serde(default, rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct RawPullRequest {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    user: RawUser,
    #[serde(default)]
    head: RawGitRef,
    #[serde(default)]
    base: RawGitRef,
    #[serde(default)]
    requested_reviewers: Vec<RawUser>,
}

#[derive(Debug, Deserialize)]
struct RawPullRequestPayload {
    #[serde(default)]
    action: String,
    pull_request: RawPullRequest,
    repository: RawRepository,
    sender: RawUser,
    installation: Option<RawInstallation>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    user: RawUser,
    #[serde(default)]
    assignees: Vec<RawUser>,
    // Present only when the issue is really a pull request
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawIssuesPayload {
    #[serde(default)]
    action: String,
    issue: RawIssue,
    repository: RawRepository,
    sender: RawUser,
    installation: Option<RawInstallation>,
}

#[derive(Debug, Deserialize)]
struct RawComment {
    #[serde(default)]
    id: u64,
    #[serde(default)]
    user: RawUser,
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct RawIssueCommentPayload {
    #[serde(default)]
    action: String,
    issue: RawIssue,
    comment: RawComment,
    repository: RawRepository,
    sender: RawUser,
    installation: Option<RawInstallation>,
}
