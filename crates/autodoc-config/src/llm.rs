//! Text-completion service configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default OpenAI-compatible API root.
fn default_base_url() -> String {
    String::from("https://api.openai.com/v1")
}

const fn default_temperature() -> f32 {
    0.2
}

/// Completion requests can take a while for large manifests.
const fn default_timeout_secs() -> u64 {
    120
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    /// Model identifier (e.g., `gpt-4o-mini`).
    #[serde(default)]
    pub model: String,

    /// Organization identifier, sent as `OpenAI-Organization` when set.
    #[serde(default)]
    pub organization: String,

    /// Project identifier, sent as `OpenAI-Project` when set.
    #[serde(default)]
    pub project: String,

    /// API credential.
    #[serde(default)]
    pub api_key: String,

    /// API root; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            organization: String::new(),
            project: String::new(),
            api_key: String::new(),
            base_url: default_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    /// Check if the minimum fields for a completion request are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Names of required fields that are empty.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model.trim().is_empty() {
            missing.push("model");
        }
        if self.api_key.trim().is_empty() {
            missing.push("api_key");
        }
        missing
    }

    /// Validate the section before a client is built from it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when `model` or `api_key` is
    /// empty, and [`ConfigError::InvalidValue`] for an unusable `base_url`,
    /// `temperature`, or `timeout_secs`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(ConfigError::NotConfigured {
                section: "llm".to_string(),
                missing: missing.join(", "),
            });
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "llm.base_url".to_string(),
                reason: format!("'{}' is not an http(s) URL", self.base_url),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "llm.temperature".to_string(),
                reason: format!("{} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "llm.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Full URL of the chat completions endpoint.
    #[must_use]
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}
