//! Environment configuration for the PR Focus service.
//!
//! All configuration is read once at startup via [`AppConfig::from_env`].
//! The webhook secret is the only hard requirement: without it every
//! delivery would be rejected, so a missing secret is a startup error
//! rather than a per-request 401.

use thiserror::Error;

use crate::ai::AiConfig;

/// Default address the HTTP server binds to.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `GITHUB_WEBHOOK_SECRET` is not set or empty.
    #[error("GITHUB_WEBHOOK_SECRET must be set to a non-empty value")]
    MissingWebhookSecret,
}

/// Application configuration, loaded from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Secret used to verify webhook HMAC signatures.
    ///
    /// Must match the secret configured on the GitHub webhook.
    pub webhook_secret: Vec<u8>,

    /// Address the HTTP server binds to.
    ///
    /// Default: `0.0.0.0:3000`. Configure via `PR_FOCUS_BIND_ADDR`.
    pub bind_addr: String,

    /// Test mode flag (`PR_FOCUS_TEST_MODE`).
    ///
    /// When enabled, the webhook endpoint accepts the signature bypass
    /// sentinel and the events DELETE endpoint is unguarded. Never enable
    /// this in a production deployment.
    pub test_mode: bool,

    /// Optional GitHub token (`GITHUB_TOKEN`) used for PR fetching when a
    /// request doesn't carry its own.
    pub github_token: Option<String>,

    /// Default AI provider configuration; individual analyze requests may
    /// override it.
    pub ai: AiConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingWebhookSecret` if `GITHUB_WEBHOOK_SECRET`
    /// is unset or empty.
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_secret = std::env::var("GITHUB_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingWebhookSecret)?;

        let bind_addr = std::env::var("PR_FOCUS_BIND_ADDR")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let test_mode = std::env::var("PR_FOCUS_TEST_MODE")
            .ok()
            .map(|s| matches!(s.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let github_token = std::env::var("GITHUB_TOKEN").ok().filter(|s| !s.is_empty());

        Ok(AppConfig {
            webhook_secret: webhook_secret.into_bytes(),
            bind_addr,
            test_mode,
            github_token,
            ai: AiConfig::from_env(),
        })
    }

    /// Creates a configuration suitable for tests: the given secret, test
    /// mode enabled, no GitHub token, and default AI settings.
    pub fn for_tests(webhook_secret: impl Into<Vec<u8>>) -> Self {
        AppConfig {
            webhook_secret: webhook_secret.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            test_mode: true,
            github_token: None,
            ai: AiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_tests_enables_test_mode() {
        let config = AppConfig::for_tests(b"secret".to_vec());
        assert!(config.test_mode);
        assert_eq!(config.webhook_secret, b"secret");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert!(config.github_token.is_none());
    }
}
