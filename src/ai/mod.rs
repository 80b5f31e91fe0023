//! AI provider dispatch: request building, response fetching, and prompt
//! construction.
//!
//! Every supported provider is described by one uniform record — URL,
//! headers, and JSON body — built in a single place per concern
//! ([`provider::build_request`]), so adding a provider touches one match
//! table instead of scattered branches. Response decoding (streamed SSE or
//! buffered envelope) is likewise one table in [`fetch`].

pub mod fetch;
pub mod prompt;
pub mod provider;

pub use fetch::{fetch_model_output, AiError};
pub use prompt::{build_analysis_prompt, DEFAULT_MAX_TOKENS, MAX_DIFF_LINES, SYSTEM_PROMPT};
pub use provider::{build_request, AiConfig, ChatMessage, ChatRole, Provider, ProviderRequest};
