//! Event listing, statistics, and clearing endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::AppState;
use crate::store::{EventQuery, EventSummary};
use crate::types::InstallationId;

/// Query parameters for `GET /api/v1/events`.
#[derive(Debug, Default, Deserialize)]
pub struct EventsParams {
    /// Maximum number of events to return (default 50).
    pub limit: Option<usize>,

    /// Filter by event kind (`pull_request`, `issue`, `issue_comment`,
    /// `pull_request_comment`). Matched verbatim; an unknown value yields an
    /// empty list.
    #[serde(rename = "type")]
    pub kind: Option<String>,

    /// Filter by repository `full_name`.
    pub repository: Option<String>,

    /// Filter by installation ID.
    pub installation_id: Option<u64>,

    /// When true, return aggregate statistics instead of the event list.
    #[serde(default)]
    pub stats: bool,
}

/// Events listing handler.
///
/// With `stats=true` the response is `{"stats": ..., "recentEvents": [...]}`
/// where `recentEvents` holds dashboard summary rows for the most recent
/// activity. Otherwise the response is `{"events": [...], "total": n,
/// "filters": {...}}`, newest event first.
pub async fn events_handler(
    State(app_state): State<AppState>,
    Query(params): Query<EventsParams>,
) -> Json<serde_json::Value> {
    if params.stats {
        let stats = app_state.events().get_stats();
        let recent: Vec<EventSummary> = stats
            .recent_activity
            .iter()
            .map(EventSummary::from_event)
            .collect();

        debug!(total = stats.total_events, "serving event stats");
        return Json(json!({
            "stats": stats,
            "recentEvents": recent,
        }));
    }

    let query = EventQuery {
        limit: params.limit,
        kind: params.kind.clone(),
        repository: params.repository.clone(),
        installation_id: params.installation_id.map(InstallationId),
    };
    let events = app_state.events().get_events(&query);

    debug!(returned = events.len(), "serving event list");
    Json(json!({
        "events": events,
        "total": events.len(),
        "filters": {
            "type": params.kind,
            "repository": params.repository,
            "installationId": params.installation_id,
        },
    }))
}

/// Event clearing handler (`DELETE /api/v1/events`).
///
/// Only available in test mode; production deployments keep their event
/// history until it ages out of the bounded store.
pub async fn clear_handler(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<serde_json::Value>) {
    if !app_state.test_mode() {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": "clearing events is only available in test mode"})),
        );
    }

    app_state.events().clear();
    info!("cleared all stored events");
    (
        StatusCode::OK,
        Json(json!({"message": "Events cleared successfully"})),
    )
}
