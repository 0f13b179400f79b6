//! Script generation via an OpenAI-compatible chat-completions API.
//!
//! This crate provides:
//! - `ScriptGenerator` trait for swappable script backends
//! - `OpenRouterClient` with model fallback and retry
//! - Prompt building and lenient JSON extraction

pub mod client;
pub mod error;
pub mod prompt;
pub mod types;

use async_trait::async_trait;

use ytbot_models::Script;

pub use client::{LlmClientConfig, OpenRouterClient};
pub use error::{LlmError, LlmResult};

/// Writes a scene-by-scene script for a topic.
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    async fn generate_script(&self, topic: &str) -> LlmResult<Script>;
}
