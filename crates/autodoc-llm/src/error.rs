//! Completion service error types.

use autodoc_config::ConfigError;
use thiserror::Error;

/// Errors from the text-completion service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The client could not be built from the supplied configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// HTTP transport error (unreachable host, timeout, undecodable body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-success status code.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the service.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The service returned a 429 Too Many Requests response.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The response had no choices or no text content.
    #[error("completion response contained no text")]
    EmptyResponse,

    /// The backend could not produce a completion for another reason.
    #[error("completion backend unavailable: {0}")]
    Unavailable(String),
}
