//! # autodoc-llm
//!
//! Text-completion backends for autodoc.
//!
//! Everything downstream talks to the service through [`Completion`]: one
//! system instruction and one user payload in, one text blob out. Two
//! implementations ship here:
//! - [`CompletionClient`], an OpenAI-compatible `/chat/completions` client
//! - [`ScriptedCompletion`], a deterministic backend replaying queued
//!   responses and recording every call

mod client;
mod error;
mod http;
mod response;
mod scripted;

pub use client::CompletionClient;
pub use error::LlmError;
pub use response::clean_response;
pub use scripted::{RecordedCall, ScriptedCompletion};

use async_trait::async_trait;

/// A request/response exchange with a text-generation backend.
///
/// Callers do not retry; a failed exchange surfaces as [`LlmError`].
#[async_trait]
pub trait Completion: Send + Sync {
    /// Generate text for `payload` under the system `instruction`.
    async fn complete(&self, instruction: &str, payload: &str) -> Result<String, LlmError>;
}
