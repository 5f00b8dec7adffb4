//! LLM client factory
//!
//! Builds the right [`LlmClient`] implementation for the configured backend.

use anyhow::Result;
use std::sync::Arc;

use crate::anthropic_client::AnthropicClient;
use crate::backend::AgentBackend;
use crate::llm_client::LlmClient;
use crate::openai_client::OpenAiClient;

/// Create an LLM client from environment variables.
///
/// Reads `AGENT_BACKEND` plus the provider's API key variable
/// (`ANTHROPIC_API_KEY` / `OPENAI_API_KEY`).
pub fn create_llm_client() -> Result<Arc<dyn LlmClient>> {
    let backend = AgentBackend::from_env();
    tracing::debug!(%backend, "creating LLM client");
    match backend {
        AgentBackend::Anthropic => Ok(Arc::new(AnthropicClient::from_env()?)),
        AgentBackend::OpenAi => Ok(Arc::new(OpenAiClient::from_env()?)),
    }
}

/// Create an LLM client for the selected backend with an explicit key.
pub fn create_llm_client_with_key(api_key: String) -> Result<Arc<dyn LlmClient>> {
    match AgentBackend::from_env() {
        AgentBackend::Anthropic => Ok(Arc::new(AnthropicClient::new(api_key))),
        AgentBackend::OpenAi => Ok(Arc::new(OpenAiClient::new(api_key))),
    }
}
