//! Fetching and decoding provider responses.
//!
//! The response body is always consumed incrementally (chunk by chunk) and
//! accumulated, whether or not the provider streams: on a decode failure the
//! caller can still show whatever raw text arrived. Decoding itself happens
//! once the body is complete — there is no incremental parse of the
//! document, only of the bytes.

use futures_util::StreamExt;
use thiserror::Error;
use tracing::{debug, warn};

use crate::ai::provider::{Provider, ProviderRequest};

/// Errors from the provider HTTP exchange.
#[derive(Debug, Error)]
pub enum AiError {
    /// The request could not be sent or the body read.
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}")]
    Provider { status: u16, body: String },
}

/// Sends a built request and returns the model's text output.
///
/// In stream mode the body is decoded as SSE `data:` lines per provider;
/// buffered mode extracts the provider's response envelope. Google always
/// takes the buffered path (its endpoint doesn't stream). If decoding yields
/// no text, the raw accumulated body is returned instead so the reconciler
/// can attach it to its error.
pub async fn fetch_model_output(
    client: &reqwest::Client,
    provider: Provider,
    request: &ProviderRequest,
    stream: bool,
) -> Result<String, AiError> {
    let mut http_request = client.post(&request.url).json(&request.body);
    for (name, value) in &request.headers {
        http_request = http_request.header(*name, value);
    }

    let response = http_request.send().await?;
    let status = response.status();

    // Accumulate the body chunk by chunk; a cancelled caller stops pulling
    // here and no further chunks are consumed.
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunks = response.bytes_stream();
    while let Some(chunk) = chunks.next().await {
        buffer.extend_from_slice(&chunk?);
    }
    let body = String::from_utf8_lossy(&buffer).into_owned();

    if !status.is_success() {
        warn!(status = status.as_u16(), provider = provider.as_str(), "provider error response");
        return Err(AiError::Provider {
            status: status.as_u16(),
            body,
        });
    }

    let text = if stream && provider.supports_streaming() {
        decode_sse(provider, &body)
    } else {
        decode_envelope(provider, &body)
    };

    if text.is_empty() {
        debug!(provider = provider.as_str(), "decoder found no text, returning raw body");
        Ok(body)
    } else {
        Ok(text)
    }
}

/// Decodes an SSE body: every `data:` line is a JSON delta, `[DONE]`
/// terminates the stream. Undecodable lines are skipped.
fn decode_sse(provider: Provider, body: &str) -> String {
    let mut text = String::new();

    for line in body.lines() {
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();
        if data == "[DONE]" {
            break;
        }
        let Ok(event) = serde_json::from_str::<serde_json::Value>(data) else {
            continue;
        };
        if let Some(delta) = extract_delta(provider, &event) {
            text.push_str(delta);
        }
    }

    text
}

/// Pulls the text delta out of one SSE event, per provider shape.
fn extract_delta<'a>(provider: Provider, event: &'a serde_json::Value) -> Option<&'a str> {
    match provider {
        Provider::Anthropic => {
            if event["type"] != "content_block_delta" {
                return None;
            }
            event["delta"]["text"].as_str()
        }
        Provider::OpenAi | Provider::Near => event["choices"][0]["delta"]["content"].as_str(),
        // No streaming decoder; handled by the buffered path.
        Provider::Google => None,
    }
}

/// Extracts the text from a buffered response envelope, per provider shape.
fn decode_envelope(provider: Provider, body: &str) -> String {
    let Ok(envelope) = serde_json::from_str::<serde_json::Value>(body) else {
        return String::new();
    };

    match provider {
        Provider::Anthropic => envelope["content"][0]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        Provider::Google => envelope["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default(),
        Provider::OpenAi | Provider::Near => envelope["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
    }
}
