//! Shared test utilities and arbitrary generators for property-based testing.

use crate::types::{CommentId, DeliveryId, InstallationId, PrNumber, Sha};
use crate::webhooks::events::{
    ActorInfo, CommentData, EventData, EventKind, IssueData, NormalizedEvent, PullRequestData,
    RepositoryInfo,
};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

pub fn arb_pr_number() -> impl Strategy<Value = PrNumber> {
    (1u64..100_000).prop_map(PrNumber)
}

pub fn arb_sha() -> impl Strategy<Value = Sha> {
    "[0-9a-f]{40}".prop_map(Sha::new)
}

pub fn arb_delivery_id() -> impl Strategy<Value = DeliveryId> {
    "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}".prop_map(DeliveryId::new)
}

pub fn arb_login() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,15}".prop_map(String::from)
}

pub fn arb_title() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,40}".prop_map(String::from)
}

pub fn arb_timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    // Anything between the epoch and 2100, whole seconds
    (0i64..4_102_444_800).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

pub fn arb_event_kind() -> impl Strategy<Value = EventKind> {
    prop_oneof![
        Just(EventKind::PullRequest),
        Just(EventKind::Issue),
        Just(EventKind::IssueComment),
        Just(EventKind::PullRequestComment),
    ]
}

pub fn arb_repository() -> impl Strategy<Value = RepositoryInfo> {
    ("[a-z][a-z0-9]{0,9}", "[a-z][a-z0-9-]{0,12}").prop_map(|(owner, name)| RepositoryInfo {
        full_name: format!("{}/{}", owner, name),
        name,
        owner,
    })
}

pub fn arb_actor() -> impl Strategy<Value = ActorInfo> {
    (
        arb_login(),
        prop_oneof![Just("User"), Just("Bot"), Just("Organization")],
    )
        .prop_map(|(login, kind)| ActorInfo {
            login,
            kind: kind.to_string(),
        })
}

pub fn arb_pull_request_data() -> impl Strategy<Value = PullRequestData> {
    (
        arb_pr_number(),
        arb_title(),
        prop_oneof![Just("open"), Just("closed")],
        arb_login(),
        arb_sha(),
        "[a-z][a-z0-9/-]{0,20}",
        prop::collection::vec(arb_login(), 0..3),
    )
        .prop_map(
            |(pr_number, pr_title, pr_state, pr_author, head_sha, base_ref, requested_reviewers)| {
                PullRequestData {
                    pr_number,
                    pr_title,
                    pr_state: pr_state.to_string(),
                    pr_author,
                    head_sha,
                    base_ref,
                    requested_reviewers,
                }
            },
        )
}

pub fn arb_issue_data() -> impl Strategy<Value = IssueData> {
    (
        1u64..100_000,
        arb_title(),
        prop_oneof![Just("open"), Just("closed")],
        arb_login(),
        prop::collection::vec(arb_login(), 0..3),
    )
        .prop_map(
            |(issue_number, issue_title, issue_state, issue_author, assignees)| IssueData {
                issue_number,
                issue_title,
                issue_state: issue_state.to_string(),
                issue_author,
                assignees,
            },
        )
}

pub fn arb_comment_data() -> impl Strategy<Value = CommentData> {
    (
        1u64..100_000,
        arb_title(),
        (1u64..10_000_000).prop_map(CommentId),
        arb_login(),
        "[a-zA-Z0-9 ]{0,100}",
        proptest::bool::ANY,
    )
        .prop_map(
            |(
                issue_number,
                issue_title,
                comment_id,
                comment_author,
                comment_body_preview,
                is_pr_comment,
            )| CommentData {
                issue_number,
                issue_title,
                comment_id,
                comment_author,
                comment_body_preview,
                is_pr_comment,
            },
        )
}

/// Generates a kind together with data of the matching variant, including the
/// issue-comment vs PR-comment split driven by `is_pr_comment`.
pub fn arb_kind_and_data() -> impl Strategy<Value = (EventKind, EventData)> {
    prop_oneof![
        arb_pull_request_data().prop_map(|d| (EventKind::PullRequest, EventData::PullRequest(d))),
        arb_issue_data().prop_map(|d| (EventKind::Issue, EventData::Issue(d))),
        arb_comment_data().prop_map(|d| {
            let kind = if d.is_pr_comment {
                EventKind::PullRequestComment
            } else {
                EventKind::IssueComment
            };
            (kind, EventData::Comment(d))
        }),
    ]
}

/// A concrete pull_request event for tests that don't need generated input.
pub fn sample_pull_request_event(id: &str) -> NormalizedEvent {
    NormalizedEvent {
        id: DeliveryId::new(id),
        kind: EventKind::PullRequest,
        action: "opened".to_string(),
        timestamp: Utc::now(),
        repository: RepositoryInfo {
            name: "hello-world".to_string(),
            full_name: "octocat/hello-world".to_string(),
            owner: "octocat".to_string(),
        },
        actor: ActorInfo {
            login: "octocat".to_string(),
            kind: "User".to_string(),
        },
        data: EventData::PullRequest(PullRequestData {
            pr_number: PrNumber(42),
            pr_title: "Add widget support".to_string(),
            pr_state: "open".to_string(),
            pr_author: "octocat".to_string(),
            head_sha: Sha::new("0123456789abcdef0123456789abcdef01234567"),
            base_ref: "main".to_string(),
            requested_reviewers: vec![],
        }),
        installation_id: None,
    }
}

pub fn arb_normalized_event() -> impl Strategy<Value = NormalizedEvent> {
    (
        arb_delivery_id(),
        arb_kind_and_data(),
        "[a-z_]{1,15}",
        arb_timestamp(),
        arb_repository(),
        arb_actor(),
        prop::option::of((1u64..1_000_000).prop_map(InstallationId)),
    )
        .prop_map(
            |(id, (kind, data), action, timestamp, repository, actor, installation_id)| {
                NormalizedEvent {
                    id,
                    kind,
                    action,
                    timestamp,
                    repository,
                    actor,
                    data,
                    installation_id,
                }
            },
        )
}
