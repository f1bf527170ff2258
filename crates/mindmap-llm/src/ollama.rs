//! Ollama chat backend
//!
//! Talks to a local or remote Ollama server through `POST /api/chat` with
//! streaming disabled, so one request yields one complete response.

use std::time::Duration;

use async_trait::async_trait;
use mindmap_core::{Conversation, GenerationError, Generator};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LlmError;
use crate::{build_http_client, Result};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "qwen3:8b";
const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Ollama configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Server URL, without a trailing `/api`
    pub base_url: String,
    /// Chat model name
    pub model: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfig {
            base_url: std::env::var("OLLAMA_BASE_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("OLLAMA_CHAT_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl OllamaConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server and model
    pub fn new(base_url: &str, model: &str) -> Self {
        OllamaConfig {
            base_url: base_url.to_string(),
            model: model.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Build the request body for a conversation
pub(crate) fn chat_request<'a>(model: &'a str, conversation: &'a Conversation) -> ChatRequest<'a> {
    ChatRequest {
        model,
        messages: conversation
            .messages()
            .iter()
            .map(|m| ChatMessage {
                role: match m.role {
                    mindmap_core::Role::System => "system",
                    mindmap_core::Role::User => "user",
                    mindmap_core::Role::Assistant => "assistant",
                },
                content: &m.content,
            })
            .collect(),
        stream: false,
    }
}

/// Pull the assistant text out of a chat response
pub(crate) fn response_text(response: ChatResponse) -> Result<String> {
    response
        .message
        .map(|m| m.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or(LlmError::EmptyResponse("ollama"))
}

/// Ollama generation backend
pub struct OllamaGenerator {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaGenerator {
    /// Create a new Ollama backend
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let http_client = build_http_client(config.timeout)?;
        Ok(OllamaGenerator {
            config,
            http_client,
        })
    }

    /// Create a backend from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(OllamaConfig::from_env())
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    async fn chat(&self, conversation: &Conversation) -> Result<String> {
        let url = self.config.chat_url();
        info!(model = %self.config.model, messages = conversation.len(), "Calling Ollama chat");

        let response = self
            .http_client
            .post(&url)
            .json(&chat_request(&self.config.model, conversation))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "ollama",
                status: status.as_u16(),
                body,
            });
        }

        let body: ChatResponse = serde_json::from_str(&response.text().await?)?;
        let text = response_text(body)?;
        debug!(chars = text.len(), "Ollama response received");
        Ok(text)
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn invoke(&self, conversation: &Conversation) -> std::result::Result<String, GenerationError> {
        Ok(self.chat(conversation).await?)
    }
}
