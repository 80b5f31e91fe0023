//! Webhook endpoint handler.
//!
//! Accepts GitHub webhook deliveries, verifies their signatures, normalizes
//! the payload into the dashboard event shape, and appends it to the
//! in-memory event store.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::AppState;
use crate::webhooks::{is_test_bypass, normalize, verify_signature, NormalizeError};

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// Header name for GitHub signature.
const HEADER_SIGNATURE: &str = "x-hub-signature-256";

/// Errors that can occur when processing a webhook.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Missing required header.
    #[error("missing required header: {0}")]
    MissingHeader(&'static str),

    /// Missing signature header.
    #[error("missing signature")]
    MissingSignature,

    /// Invalid signature.
    #[error("invalid signature")]
    InvalidSignature,

    /// Invalid JSON body.
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The payload couldn't be normalized.
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let status = match &self {
            WebhookError::MissingHeader(_) => StatusCode::BAD_REQUEST,
            WebhookError::MissingSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,
            WebhookError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            WebhookError::Normalize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

/// Webhook handler.
///
/// # Request
///
/// - Method: POST
/// - Required headers:
///   - `X-GitHub-Event`: Event type (e.g., "pull_request", "issue_comment")
///   - `X-Hub-Signature-256`: HMAC-SHA256 signature of the payload
/// - Optional header:
///   - `X-GitHub-Delivery`: Unique delivery ID (a fallback ID is synthesized
///     when absent)
/// - Body: JSON webhook payload
///
/// # Response
///
/// - 200 OK: Event stored (or a ping answered, or an untracked type skipped)
/// - 400 Bad Request: Missing event header or invalid JSON
/// - 401 Unauthorized: Missing or invalid signature
/// - 500 Internal Server Error: Payload couldn't be normalized
pub async fn webhook_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError> {
    let event_type = get_header(&headers, HEADER_EVENT)?;
    let delivery_id = headers
        .get(HEADER_DELIVERY)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let signature_header = headers
        .get(HEADER_SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    debug!(
        delivery_id = delivery_id.as_deref().unwrap_or("<none>"),
        event_type = %event_type,
        "Received webhook"
    );

    // Verify the signature BEFORE any parsing: malformed bodies from an
    // unauthenticated sender should never reach the JSON parser. The bypass
    // sentinel is only honored when the server runs in test mode.
    let bypassed = is_test_bypass(signature_header) && app_state.test_mode();
    if bypassed {
        warn!(event_type = %event_type, "accepting webhook with test bypass signature");
    } else if !verify_signature(&body, signature_header, app_state.webhook_secret()) {
        warn!(
            delivery_id = delivery_id.as_deref().unwrap_or("<none>"),
            "Invalid webhook signature"
        );
        return Err(WebhookError::InvalidSignature);
    }

    let payload: serde_json::Value = serde_json::from_slice(&body)?;

    // GitHub sends a ping when the webhook is first configured.
    if event_type == "ping" {
        info!("Received ping webhook");
        return Ok(Json(json!({"message": "pong"})));
    }

    match normalize(&event_type, &payload, delivery_id.as_deref())? {
        Some(event) => {
            info!(
                delivery_id = %event.id,
                event_type = %event.kind.as_str(),
                action = %event.action,
                repository = %event.repository.full_name,
                "Webhook event stored"
            );
            app_state.events().store(event);
        }
        None => {
            debug!(event_type = %event_type, "Untracked event type, not stored");
        }
    }

    Ok(Json(json!({"message": "Event processed successfully"})))
}

/// Extracts a required header value as a string.
fn get_header(headers: &HeaderMap, name: &'static str) -> Result<String, WebhookError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .ok_or(WebhookError::MissingHeader(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_header_present() {
        let mut headers = HeaderMap::new();
        headers.insert("x-github-event", "pull_request".parse().unwrap());

        let result = get_header(&headers, "x-github-event").unwrap();
        assert_eq!(result, "pull_request");
    }

    #[test]
    fn get_header_missing() {
        let headers = HeaderMap::new();

        let result = get_header(&headers, "x-github-event");
        assert!(matches!(result, Err(WebhookError::MissingHeader(_))));
    }

    #[test]
    fn error_status_codes() {
        use axum::response::IntoResponse;

        let cases = [
            (
                WebhookError::MissingHeader("x-github-event"),
                StatusCode::BAD_REQUEST,
            ),
            (WebhookError::MissingSignature, StatusCode::UNAUTHORIZED),
            (WebhookError::InvalidSignature, StatusCode::UNAUTHORIZED),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }

        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            WebhookError::InvalidJson(json_error).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
