//! PR analysis endpoint.
//!
//! `POST /api/v1/analyze` fetches a pull request from GitHub, asks the
//! configured model provider to reorganize its diff into logical changes,
//! and returns the reconciled analysis. Results are cached by head commit
//! SHA, so re-analyzing an unchanged PR never invokes the model again.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::AppState;
use crate::ai::prompt::limit_lines;
use crate::ai::{
    build_analysis_prompt, build_request, fetch_model_output, AiConfig, AiError, ChatMessage,
    Provider, DEFAULT_MAX_TOKENS, MAX_DIFF_LINES, SYSTEM_PROMPT,
};
use crate::analysis::{AnalysisResult, ReconcileError};
use crate::github::{parse_pr_url, GitHubApiError, GitHubClient, PrFile};
use crate::types::{PrNumber, RepoId, Sha};

/// Request body for the analyze endpoint.
///
/// The target PR is named either by `url` or by the `owner`/`repo`/`number`
/// triple. Everything else overrides the server's defaults for this one
/// request.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Full PR URL, e.g. `https://github.com/octocat/hello-world/pull/42`.
    pub url: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    pub number: Option<u64>,

    /// Provider override (`anthropic`, `google`, `openai`, `near`).
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,

    /// GitHub token override for fetching the PR.
    pub github_token: Option<String>,

    /// Whether to request a streamed model response (default true).
    pub stream: Option<bool>,
    pub max_tokens: Option<u32>,
}

/// Response body for the analyze endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub head_sha: Sha,
    /// True when the analysis came from the cache without a model call.
    pub cached: bool,
    pub analysis: AnalysisResult,
}

/// Errors that can occur while analyzing a PR.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// Neither a URL nor an owner/repo/number triple was given.
    #[error("request must name a PR via url or owner, repo, and number")]
    MissingTarget,

    /// The given URL isn't a GitHub PR URL.
    #[error("not a GitHub PR URL: {0}")]
    InvalidPrUrl(String),

    /// No API key for the selected provider, neither in the request nor in
    /// the server configuration.
    #[error("no API key configured for provider {0}")]
    MissingApiKey(&'static str),

    /// GitHub fetch failed.
    #[error("GitHub fetch failed: {0}")]
    GitHub(#[from] GitHubApiError),

    /// The provider exchange failed.
    #[error("model provider request failed: {0}")]
    Ai(#[from] AiError),

    /// The model's output couldn't be reconciled into an analysis.
    #[error("could not reconcile model output: {0}")]
    Reconcile(#[from] ReconcileError),
}

impl IntoResponse for AnalyzeError {
    fn into_response(self) -> Response {
        let status = match &self {
            AnalyzeError::MissingTarget
            | AnalyzeError::InvalidPrUrl(_)
            | AnalyzeError::MissingApiKey(_) => StatusCode::BAD_REQUEST,
            AnalyzeError::GitHub(_) | AnalyzeError::Ai(_) => StatusCode::BAD_GATEWAY,
            AnalyzeError::Reconcile(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };

        // The raw model output travels with reconcile failures so the caller
        // can inspect what the model actually said.
        let body = match &self {
            AnalyzeError::Reconcile(e) => json!({
                "error": self.to_string(),
                "raw": e.raw(),
            }),
            _ => json!({"error": self.to_string()}),
        };

        (status, Json(body)).into_response()
    }
}

/// Analyze handler.
///
/// # Response
///
/// - 200 OK: `{"headSha", "cached", "analysis"}`
/// - 400 Bad Request: No target PR or no API key
/// - 422 Unprocessable Entity: Model output couldn't be reconciled
/// - 502 Bad Gateway: GitHub or the model provider failed
pub async fn analyze_handler(
    State(app_state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let (repo, number) = resolve_target(&request)?;
    let ai = resolve_ai_config(app_state.ai(), &request);
    if ai.api_key.is_empty() {
        return Err(AnalyzeError::MissingApiKey(ai.provider.as_str()));
    }

    let github = match request
        .github_token
        .as_deref()
        .or(app_state.github_token())
    {
        Some(token) => GitHubClient::from_token(token, repo)?,
        None => GitHubClient::anonymous(repo),
    };

    let pr = github.get_pr(number).await?;

    // A cached analysis for this head commit skips GitHub's file listing and
    // the model call entirely.
    if let Some(analysis) = app_state.analysis_cache().get(&pr.head_sha) {
        info!(pr = %number, head_sha = %pr.head_sha.short(), "serving cached analysis");
        return Ok(Json(AnalyzeResponse {
            head_sha: pr.head_sha,
            cached: true,
            analysis,
        }));
    }

    let files = github.list_pr_files(number).await?;
    let changed_files: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();
    let file_changes = limit_lines(&concat_file_changes(&files), MAX_DIFF_LINES);

    let prompt = build_analysis_prompt(&pr.body, &changed_files, &file_changes);
    let messages = [ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

    let stream = request.stream.unwrap_or(true);
    let max_tokens = request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let provider_request = build_request(&ai, &messages, max_tokens, stream);

    info!(
        pr = %number,
        head_sha = %pr.head_sha.short(),
        provider = ai.provider.as_str(),
        model = %ai.model,
        files = files.len(),
        "requesting PR analysis"
    );

    let output = fetch_model_output(app_state.http(), ai.provider, &provider_request, stream)
        .await?;

    let (analysis, cached) = app_state
        .analysis_cache()
        .reconcile_cached(&pr.head_sha, &output)
        .map_err(|e| {
            warn!(pr = %number, error = %e, "model output failed reconciliation");
            e
        })?;

    Ok(Json(AnalyzeResponse {
        head_sha: pr.head_sha,
        cached,
        analysis,
    }))
}

/// Resolves which PR to analyze from the request.
fn resolve_target(request: &AnalyzeRequest) -> Result<(RepoId, PrNumber), AnalyzeError> {
    if let Some(url) = &request.url {
        return parse_pr_url(url).ok_or_else(|| AnalyzeError::InvalidPrUrl(url.clone()));
    }

    match (&request.owner, &request.repo, request.number) {
        (Some(owner), Some(repo), Some(number)) => {
            Ok((RepoId::new(owner, repo), PrNumber(number)))
        }
        _ => Err(AnalyzeError::MissingTarget),
    }
}

/// Merges request overrides over the server's default AI configuration.
///
/// When the request selects a different provider than the server default,
/// the default API key and model do not carry over; the request must bring
/// its own key (the model falls back to the provider's default).
fn resolve_ai_config(default: &AiConfig, request: &AnalyzeRequest) -> AiConfig {
    let provider = request
        .provider
        .as_deref()
        .map(Provider::parse)
        .unwrap_or(default.provider);
    let same_provider = provider == default.provider;

    let api_key = request
        .api_key
        .clone()
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| {
            if same_provider {
                default.api_key.clone()
            } else {
                String::new()
            }
        });

    let model = request
        .model
        .clone()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            if same_provider {
                default.model.clone()
            } else {
                provider.default_model().to_string()
            }
        });

    AiConfig {
        provider,
        api_key,
        model,
    }
}

/// Concatenates per-file patches into the prompt's diff section. Files
/// without a patch (binary or oversized) contribute only their name.
fn concat_file_changes(files: &[PrFile]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str("File: ");
        out.push_str(&file.filename);
        out.push('\n');
        if let Some(patch) = &file.patch {
            out.push_str(patch);
            out.push('\n');
        }
        out.push('\n');
    }
    out
}
