//! Agentic layer for the MiniSpec engine.
//!
//! Everything that talks to the outside world lives here: LLM provider
//! clients behind the [`LlmClient`] trait, perception collaborators behind
//! [`VisionService`] and [`FrameSource`], prompt assembly, and the
//! [`SessionController`] that drives the generate → validate → execute →
//! verify cycle for each task.

pub mod anthropic_client;
pub mod backend;
pub mod client_factory;
pub mod llm_client;
pub mod openai_client;
pub mod prompt;
pub mod response;
pub mod scene;
pub mod session;
pub mod vision;

pub use backend::AgentBackend;
pub use client_factory::{create_llm_client, create_llm_client_with_key};
pub use llm_client::LlmClient;
pub use response::{coerce_query_reply, strip_code_blocks, QueryAnswer, VerificationResult};
pub use scene::SceneDescription;
pub use session::{
    PlanningAttempt, PlanningSession, SessionConfig, SessionController, SessionError, TaskOutcome,
};
pub use vision::{
    BoundingBox, DetectedObject, FrameSource, HttpFrameSource, HttpVisionClient, VisionService,
};
