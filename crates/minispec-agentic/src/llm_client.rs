//! LLM Client abstraction
//!
//! One trait, multiple providers. The engine only ever needs plain
//! completions: a system prompt carrying the static planning context and a
//! user prompt carrying the task, scene, and any correction feedback.

use anyhow::Result;
use async_trait::async_trait;

/// A completion-capable language model client.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a system + user prompt, return the model's text response.
    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Provider name ("Anthropic", "OpenAI"), for logs.
    fn provider_name(&self) -> &str;
}
