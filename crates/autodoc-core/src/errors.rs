//! Cross-cutting error types for autodoc.
//!
//! Component errors (`LlmError`, `GenerationError`, `EngineError`) live in
//! their own crates. The binary converges them through `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any autodoc crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A string could not be used as a column identifier.
    #[error("Invalid identifier {raw:?}: {reason}")]
    InvalidIdentifier { raw: String, reason: &'static str },
}
