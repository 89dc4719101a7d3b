//! OpenAI-compatible chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use autodoc_config::LlmConfig;

use crate::error::LlmError;
use crate::http::check_response;
use crate::response::{ChatMessage, ChatRequest, ChatResponse, clean_response};
use crate::Completion;

/// HTTP client for a `/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
    organization: Option<String>,
    project: Option<String>,
    temperature: f32,
}

impl CompletionClient {
    /// Build a client from a validated [`LlmConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Config`] if the model or API key is missing or a
    /// value is invalid, and [`LlmError::Http`] if the HTTP client cannot be
    /// built.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("autodoc/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: config.completions_url(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            organization: non_empty(&config.organization),
            project: non_empty(&config.project),
            temperature: config.temperature,
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[async_trait]
impl Completion for CompletionClient {
    async fn complete(&self, instruction: &str, payload: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: instruction,
                },
                ChatMessage {
                    role: "user",
                    content: payload,
                },
            ],
            temperature: self.temperature,
        };

        let mut builder = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request);
        if let Some(organization) = &self.organization {
            builder = builder.header("OpenAI-Organization", organization);
        }
        if let Some(project) = &self.project {
            builder = builder.header("OpenAI-Project", project);
        }

        tracing::debug!(
            model = %self.model,
            instruction_len = instruction.len(),
            payload_len = payload.len(),
            "sending completion request"
        );

        let resp = check_response(builder.send().await?).await?;
        let data: ChatResponse = resp.json().await?;
        let text = clean_response(&data.into_text()?);

        tracing::debug!(model = %self.model, response_len = text.len(), "completion received");
        Ok(text)
    }
}
