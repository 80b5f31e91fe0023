//! HTTP server for the PR Focus dashboard backend.
//!
//! This module implements the HTTP server that:
//! - Accepts webhooks from GitHub, validates signatures, and stores the
//!   normalized events in a bounded in-memory log
//! - Serves the stored events and aggregate statistics to the dashboard
//! - Runs PR analyses against the configured model provider
//! - Provides health checks for liveness probes
//!
//! # Endpoints
//!
//! - `POST /webhook` - Accepts GitHub webhook deliveries
//! - `GET /api/v1/events` - Returns stored events (or stats with `?stats=true`)
//! - `DELETE /api/v1/events` - Clears stored events (test mode only)
//! - `POST /api/v1/analyze` - Analyzes a pull request
//! - `GET /health` - Returns 200 if server is running

use std::sync::Arc;

pub mod analyze;
pub mod events;
pub mod health;
pub mod webhook;

pub use analyze::{analyze_handler, AnalyzeRequest, AnalyzeResponse};
pub use events::{clear_handler, events_handler};
pub use health::health_handler;
pub use webhook::webhook_handler;

use crate::ai::AiConfig;
use crate::analysis::AnalysisCache;
use crate::config::AppConfig;
use crate::store::EventStore;

/// Shared application state.
///
/// This is passed to all handlers via Axum's `State` extractor. It holds the
/// in-memory stores and the configuration needed for webhook verification
/// and PR analysis.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Bounded log of normalized webhook events.
    events: EventStore,

    /// Reconciled analyses keyed by head commit SHA.
    analysis_cache: AnalysisCache,

    /// HTTP client used for model provider requests.
    http: reqwest::Client,

    /// Webhook secret for HMAC-SHA256 signature verification.
    webhook_secret: Vec<u8>,

    /// Whether test-only surfaces (signature bypass, event clearing) are
    /// enabled.
    test_mode: bool,

    /// Fallback GitHub token for PR fetching.
    github_token: Option<String>,

    /// Default AI provider configuration.
    ai: AiConfig,
}

impl AppState {
    /// Creates a new `AppState` from loaded configuration.
    pub fn new(config: AppConfig) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                events: EventStore::new(),
                analysis_cache: AnalysisCache::new(),
                http: reqwest::Client::new(),
                webhook_secret: config.webhook_secret,
                test_mode: config.test_mode,
                github_token: config.github_token,
                ai: config.ai,
            }),
        }
    }

    /// Returns the event store.
    pub fn events(&self) -> &EventStore {
        &self.inner.events
    }

    /// Returns the analysis cache.
    pub fn analysis_cache(&self) -> &AnalysisCache {
        &self.inner.analysis_cache
    }

    /// Returns the shared HTTP client.
    pub fn http(&self) -> &reqwest::Client {
        &self.inner.http
    }

    /// Returns the webhook secret.
    pub fn webhook_secret(&self) -> &[u8] {
        &self.inner.webhook_secret
    }

    /// Returns whether test-only surfaces are enabled.
    pub fn test_mode(&self) -> bool {
        self.inner.test_mode
    }

    /// Returns the fallback GitHub token, if configured.
    pub fn github_token(&self) -> Option<&str> {
        self.inner.github_token.as_deref()
    }

    /// Returns the default AI configuration.
    pub fn ai(&self) -> &AiConfig {
        &self.inner.ai
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::{get, post};

    axum::Router::new()
        .route("/webhook", post(webhook_handler))
        .route("/api/v1/events", get(events_handler).delete(clear_handler))
        .route("/api/v1/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn app_state_accessors_work() {
        let state = AppState::new(AppConfig::for_tests(b"test-secret".to_vec()));

        assert_eq!(state.webhook_secret(), b"test-secret");
        assert!(state.test_mode());
        assert!(state.github_token().is_none());
        assert!(state.events().is_empty());
        assert!(state.analysis_cache().is_empty());
    }

    #[test]
    fn app_state_clones_share_the_store() {
        let state = AppState::new(AppConfig::for_tests(b"secret".to_vec()));
        let cloned = state.clone();

        state
            .events()
            .store(crate::test_utils::sample_pull_request_event("ev-1"));
        assert_eq!(cloned.events().len(), 1);
    }
}
