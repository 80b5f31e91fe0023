//! Bounded in-memory store of normalized webhook events.
//!
//! The store keeps the most recent events (newest first) up to a fixed
//! capacity; old events fall off the back on overflow. It is deliberately
//! memory-only: events are dashboard telemetry, not durable state, and a
//! restart starting from an empty log is acceptable.
//!
//! The store is shared mutable state. Every operation takes the internal
//! mutex for its whole duration and never awaits while holding it, so
//! concurrent webhook deliveries serialize cleanly without lost inserts or
//! torn truncations. There is no deduplication by delivery ID; GitHub may
//! redeliver and duplicates are acceptable.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::types::InstallationId;
use crate::webhooks::events::{EventData, EventKind, NormalizedEvent};

/// Maximum number of events retained in memory.
pub const MAX_EVENTS: usize = 1000;

/// Default number of events returned by a query that doesn't specify a limit.
pub const DEFAULT_QUERY_LIMIT: usize = 50;

/// Number of events included in the stats `recentActivity` list.
const RECENT_ACTIVITY_COUNT: usize = 10;

/// Filters for [`EventStore::get_events`].
///
/// Filters apply in order: kind, then repository, then installation. The
/// `kind` filter is matched verbatim against the event kind string, so an
/// unknown value matches nothing and yields an empty result rather than an
/// error.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Maximum number of events to return. `None` means [`DEFAULT_QUERY_LIMIT`].
    pub limit: Option<usize>,

    /// Keep only events whose kind string equals this value.
    pub kind: Option<String>,

    /// Keep only events for this repository (`full_name`).
    pub repository: Option<String>,

    /// Keep only events delivered through this installation.
    pub installation_id: Option<InstallationId>,
}

/// Aggregate statistics over the stored events.
///
/// Field names serialize in camelCase; this is the dashboard's wire contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventStats {
    pub total_events: usize,
    pub events_by_type: HashMap<String, usize>,
    pub events_by_repository: HashMap<String, usize>,
    pub recent_activity: Vec<NormalizedEvent>,
}

/// One dashboard row summarizing an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub action: String,
    pub repository: String,
    pub actor: String,
    pub timestamp: String,
    pub description: String,
}

impl EventSummary {
    /// Builds the dashboard summary row for an event.
    pub fn from_event(event: &NormalizedEvent) -> Self {
        let description = match (&event.kind, &event.data) {
            (EventKind::PullRequest, EventData::PullRequest(data)) => {
                format!("PR #{}: {}", data.pr_number.0, data.pr_title)
            }
            (EventKind::Issue, EventData::Issue(data)) => {
                format!("Issue #{}: {}", data.issue_number, data.issue_title)
            }
            (EventKind::PullRequestComment, EventData::Comment(data)) => {
                format!("Comment on PR #{}", data.issue_number)
            }
            (EventKind::IssueComment, EventData::Comment(data)) => {
                format!("Comment on Issue #{}", data.issue_number)
            }
            // Kind/data mismatch shouldn't happen; fall back to the action.
            _ => event.action.clone(),
        };

        EventSummary {
            id: event.id.to_string(),
            kind: event.kind.as_str().to_string(),
            action: event.action.clone(),
            repository: event.repository.full_name.clone(),
            actor: event.actor.login.clone(),
            timestamp: event.timestamp.to_rfc3339(),
            description,
        }
    }
}

/// Bounded, insertion-ordered log of normalized events, newest first.
#[derive(Debug)]
pub struct EventStore {
    events: Mutex<VecDeque<NormalizedEvent>>,
    capacity: usize,
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStore {
    /// Creates an empty store with the standard capacity ([`MAX_EVENTS`]).
    pub fn new() -> Self {
        Self::with_capacity(MAX_EVENTS)
    }

    /// Creates an empty store with a custom capacity. Intended for tests.
    pub fn with_capacity(capacity: usize) -> Self {
        EventStore {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(MAX_EVENTS))),
            capacity,
        }
    }

    /// Stores an event at the front of the log, evicting the oldest entries
    /// if the log exceeds capacity.
    pub fn store(&self, event: NormalizedEvent) {
        let mut events = self.events.lock().expect("event store lock poisoned");
        events.push_front(event);
        while events.len() > self.capacity {
            events.pop_back();
        }
        debug!(total = events.len(), "stored webhook event");
    }

    /// Returns events matching the query, newest first, up to the limit.
    pub fn get_events(&self, query: &EventQuery) -> Vec<NormalizedEvent> {
        let events = self.events.lock().expect("event store lock poisoned");
        let limit = query.limit.unwrap_or(DEFAULT_QUERY_LIMIT);

        events
            .iter()
            .filter(|e| match &query.kind {
                Some(kind) => e.kind.as_str() == kind,
                None => true,
            })
            .filter(|e| match &query.repository {
                Some(repo) => &e.repository.full_name == repo,
                None => true,
            })
            .filter(|e| match query.installation_id {
                Some(id) => e.installation_id == Some(id),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }

    /// Computes aggregate statistics in a single pass over the log.
    pub fn get_stats(&self) -> EventStats {
        let events = self.events.lock().expect("event store lock poisoned");

        let mut events_by_type: HashMap<String, usize> = HashMap::new();
        let mut events_by_repository: HashMap<String, usize> = HashMap::new();
        for event in events.iter() {
            *events_by_type
                .entry(event.kind.as_str().to_string())
                .or_insert(0) += 1;
            *events_by_repository
                .entry(event.repository.full_name.clone())
                .or_insert(0) += 1;
        }

        EventStats {
            total_events: events.len(),
            events_by_type,
            events_by_repository,
            recent_activity: events.iter().take(RECENT_ACTIVITY_COUNT).cloned().collect(),
        }
    }

    /// Empties the log. Exposed over HTTP only behind the test-mode guard.
    pub fn clear(&self) {
        let mut events = self.events.lock().expect("event store lock poisoned");
        events.clear();
        info!("event store cleared");
    }

    /// Returns the number of stored events.
    pub fn len(&self) -> usize {
        self.events.lock().expect("event store lock poisoned").len()
    }

    /// Returns true if no events are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
