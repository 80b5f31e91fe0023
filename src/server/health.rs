//! Health check endpoint for liveness probes.

use axum::Json;
use serde_json::json;

/// Health check handler.
///
/// Returns 200 OK with `{"status": "ok"}`. Used by load balancers and
/// orchestration systems to verify the server is accepting connections.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}
