//! Provider selection, configuration, and request building.

use serde_json::json;

/// A supported model provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    Google,
    OpenAi,
    /// NEAR AI exposes an OpenAI-compatible API at a different host.
    Near,
}

impl Provider {
    /// Parses a provider name. Unknown strings fall back to the default
    /// (OpenAI), matching the permissive config handling upstream of it.
    pub fn parse(name: &str) -> Self {
        match name {
            "anthropic" => Provider::Anthropic,
            "google" => Provider::Google,
            "near" => Provider::Near,
            _ => Provider::OpenAi,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Google => "google",
            Provider::OpenAi => "openai",
            Provider::Near => "near",
        }
    }

    /// Whether this provider has an SSE streaming decoder here.
    ///
    /// Google's `generateContent` endpoint is buffered, so stream mode
    /// degrades to a buffered read for it.
    pub fn supports_streaming(&self) -> bool {
        !matches!(self, Provider::Google)
    }

    /// The default model for this provider.
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-opus-20240229",
            Provider::Google => "gemini-1.5-pro",
            Provider::OpenAi => "gpt-4o",
            Provider::Near => "near-small",
        }
    }
}

/// Resolved AI configuration: which provider, with which key and model.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            provider: Provider::OpenAi,
            api_key: String::new(),
            model: Provider::OpenAi.default_model().to_string(),
        }
    }
}

impl AiConfig {
    /// Reads the provider selection and per-provider key/model variables
    /// from the environment.
    ///
    /// `AI_PROVIDER` picks the provider; `<PROVIDER>_API_KEY` and
    /// `<PROVIDER>_MODEL` configure it. A missing key resolves to an empty
    /// string here and is rejected at request time, so the service can
    /// start without AI configured.
    pub fn from_env() -> Self {
        let provider = std::env::var("AI_PROVIDER")
            .map(|s| Provider::parse(&s))
            .unwrap_or(Provider::OpenAi);

        let (key_var, model_var) = match provider {
            Provider::Anthropic => ("ANTHROPIC_API_KEY", "ANTHROPIC_MODEL"),
            Provider::Google => ("GOOGLE_API_KEY", "GOOGLE_MODEL"),
            Provider::OpenAi => ("OPENAI_API_KEY", "OPENAI_MODEL"),
            Provider::Near => ("NEAR_API_KEY", "NEAR_MODEL"),
        };

        AiConfig {
            provider,
            api_key: std::env::var(key_var).unwrap_or_default(),
            model: std::env::var(model_var)
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| provider.default_model().to_string()),
        }
    }
}

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One message in the conversation sent to the provider.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// A fully built provider HTTP request: where to POST, with which headers,
/// and what JSON body.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: serde_json::Value,
}

/// Sampling temperature sent to Google's generationConfig.
const GOOGLE_TEMPERATURE: f64 = 0.7;

/// Builds the provider-specific request for a conversation.
///
/// The wire shapes:
/// - Anthropic's Messages API takes system prompts in a top-level `system`
///   field and rejects `role: "system"` entries, so system messages are
///   split out of the message list. `max_tokens` is required.
/// - Google's `generateContent` takes `contents` with `parts` and calls the
///   assistant role `model`; there is no stream flag because the endpoint
///   is buffered.
/// - OpenAI and NEAR share the Chat Completions shape.
pub fn build_request(
    config: &AiConfig,
    messages: &[ChatMessage],
    max_tokens: u32,
    stream: bool,
) -> ProviderRequest {
    match config.provider {
        Provider::Anthropic => {
            let system = messages
                .iter()
                .filter(|m| m.role == ChatRole::System)
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n");
            let chat: Vec<serde_json::Value> = messages
                .iter()
                .filter(|m| m.role != ChatRole::System)
                .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                .collect();

            let mut body = json!({
                "model": config.model,
                "max_tokens": max_tokens,
                "messages": chat,
                "stream": stream,
            });
            if !system.is_empty() {
                body["system"] = json!(system);
            }

            ProviderRequest {
                url: "https://api.anthropic.com/v1/messages".to_string(),
                headers: vec![
                    ("x-api-key", config.api_key.clone()),
                    ("anthropic-version", "2023-06-01".to_string()),
                ],
                body,
            }
        }
        Provider::Google => {
            let contents: Vec<serde_json::Value> = messages
                .iter()
                .map(|m| {
                    let role = match m.role {
                        ChatRole::Assistant => "model",
                        _ => "user",
                    };
                    json!({"role": role, "parts": [{"text": m.content}]})
                })
                .collect();

            ProviderRequest {
                url: format!(
                    "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
                    config.model
                ),
                headers: vec![("x-goog-api-key", config.api_key.clone())],
                body: json!({
                    "contents": contents,
                    "generationConfig": {
                        "temperature": GOOGLE_TEMPERATURE,
                        "maxOutputTokens": max_tokens,
                    },
                }),
            }
        }
        Provider::OpenAi | Provider::Near => {
            let chat: Vec<serde_json::Value> = messages
                .iter()
                .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
                .collect();

            let url = match config.provider {
                Provider::Near => "https://api.near.ai/v1/chat/completions",
                _ => "https://api.openai.com/v1/chat/completions",
            };

            ProviderRequest {
                url: url.to_string(),
                headers: vec![("authorization", format!("Bearer {}", config.api_key))],
                body: json!({
                    "model": config.model,
                    "messages": chat,
                    "max_tokens": max_tokens,
                    "stream": stream,
                }),
            }
        }
    }
}
