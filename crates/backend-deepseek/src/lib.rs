//! Completion service backend.
//!
//! Provides the `CompletionBackend` trait and its DeepSeek chat-completions
//! implementation. The engine only ever sees the trait, so tests swap in a
//! scripted backend and the service can change without touching matching.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors from completion backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Backend not available")]
    Unavailable,
}

/// Trait for text completion services.
pub trait CompletionBackend {
    /// Complete a prompt, returning the service's reply text.
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Check if the backend is reachable.
    fn health_check(&self) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Get the backend name for logging.
    fn name(&self) -> &'static str;
}

/// DeepSeek backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepSeekConfig {
    /// API root, without the endpoint path
    pub base_url: String,
    /// Bearer token; requests are sent unauthenticated when absent
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            api_key: None,
            model: "deepseek-chat".to_string(),
            timeout_secs: 8,
            temperature: 0.7,
            max_tokens: 800,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// DeepSeek chat-completions backend.
pub struct DeepSeekBackend {
    config: DeepSeekConfig,
    client: reqwest::Client,
}

impl DeepSeekBackend {
    /// Create a new DeepSeek backend.
    pub fn new(config: DeepSeekConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Build the chat request body for a prompt.
    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout(Duration::from_secs(self.config.timeout_secs))
        } else {
            BackendError::Connection(error.to_string())
        }
    }

    /// Extract the reply text from a chat-completions response body.
    fn parse_response(body: &str) -> Result<String, BackendError> {
        let response: ChatResponse =
            serde_json::from_str(body).map_err(|e| BackendError::ParseError(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BackendError::ParseError("Missing choices[0].message.content".to_string()))
    }
}

impl CompletionBackend for DeepSeekBackend {
    async fn complete(&self, prompt: &str) -> Result<String, BackendError> {
        let body = self.build_request(prompt);

        tracing::debug!(model = %self.config.model, prompt_len = prompt.len(), "Sending completion request");

        let response = self
            .authorize(self.client.post(self.endpoint("/chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::RequestFailed(format!("HTTP {}: {}", status, body)));
        }

        let text = response.text().await.map_err(|e| self.transport_error(e))?;
        let content = Self::parse_response(&text)?;

        tracing::debug!(reply_len = content.len(), "Completion received");
        Ok(content)
    }

    async fn health_check(&self) -> Result<(), BackendError> {
        let response = self
            .authorize(self.client.get(self.endpoint("/models")))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(BackendError::Unavailable)
        }
    }

    fn name(&self) -> &'static str {
        "deepseek"
    }
}
