//! Backend selection
//!
//! `AGENT_BACKEND` picks the model provider: `anthropic` (default) or
//! `openai`.

use std::fmt;

/// Supported LLM backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentBackend {
    Anthropic,
    OpenAi,
}

impl AgentBackend {
    /// Read the backend from `AGENT_BACKEND`, defaulting to Anthropic.
    pub fn from_env() -> Self {
        match std::env::var("AGENT_BACKEND") {
            Ok(v) if v.eq_ignore_ascii_case("openai") => AgentBackend::OpenAi,
            _ => AgentBackend::Anthropic,
        }
    }
}

impl fmt::Display for AgentBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentBackend::Anthropic => f.write_str("anthropic"),
            AgentBackend::OpenAi => f.write_str("openai"),
        }
    }
}
