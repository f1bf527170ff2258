//! Google Gemini backend
//!
//! Uses the `generateContent` REST endpoint. The system instruction travels
//! in `systemInstruction`; the remaining turns map onto `user`/`model` roles.

use std::time::Duration;

use async_trait::async_trait;
use mindmap_core::{Conversation, GenerationError, Generator, Role};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::LlmError;
use crate::{build_http_client, Result};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Gemini configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API base URL
    pub endpoint: String,
    /// Model identifier, e.g. `gemini-2.0-flash`
    pub model: String,
    /// API key sent in the `x-goog-api-key` header
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: std::env::var("GEMINI_MODEL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GeminiConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Override the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Override the endpoint (useful for proxies)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Build the request body for a conversation.
///
/// System messages are concatenated into `systemInstruction`.
pub(crate) fn generate_request(conversation: &Conversation) -> GenerateRequest<'_> {
    let mut system = Vec::new();
    let mut contents = Vec::new();

    for message in conversation.messages() {
        let part = Part {
            text: &message.content,
        };
        match message.role {
            Role::System => system.push(part),
            Role::User => contents.push(Content {
                role: Some("user"),
                parts: vec![part],
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model"),
                parts: vec![part],
            }),
        }
    }

    GenerateRequest {
        system_instruction: (!system.is_empty()).then_some(Content {
            role: None,
            parts: system,
        }),
        contents,
    }
}

/// Join the text parts of the first candidate
pub(crate) fn response_text(response: GenerateResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse("gemini"));
    }
    Ok(text)
}

/// Gemini generation backend
pub struct GeminiGenerator {
    config: GeminiConfig,
    api_key: String,
    http_client: reqwest::Client,
}

impl GeminiGenerator {
    /// Create a new Gemini backend. Fails without an API key.
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(LlmError::MissingApiKey("gemini"))?;
        let http_client = build_http_client(config.timeout)?;
        Ok(GeminiGenerator {
            config,
            api_key,
            http_client,
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate_content(&self, conversation: &Conversation) -> Result<String> {
        info!(model = %self.config.model, messages = conversation.len(), "Calling Gemini generateContent");

        let response = self
            .http_client
            .post(self.config.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&generate_request(conversation))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: "gemini",
                status: status.as_u16(),
                body,
            });
        }

        let body: GenerateResponse = serde_json::from_str(&response.text().await?)?;
        let text = response_text(body)?;
        debug!(chars = text.len(), "Gemini response received");
        Ok(text)
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn invoke(&self, conversation: &Conversation) -> std::result::Result<String, GenerationError> {
        Ok(self.generate_content(conversation).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_maps_roles() {
        let mut conv = Conversation::seed("be terse", "article body");
        conv.push_assistant(">Root");
        conv.push_feedback("Line 1: fix it");

        let body = serde_json::to_value(generate_request(&conv)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be terse");
        assert!(body["systemInstruction"].get("role").is_none());

        let roles: Vec<_> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(body["contents"][1]["parts"][0]["text"], ">Root");
    }

    #[test]
    fn test_response_joins_parts() {
        let raw = r#"{
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "Root\n"}, {"text": ">Child"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }"#;
        let parsed: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response_text(parsed).unwrap(), "Root\n>Child");
    }

    #[test]
    fn test_blocked_response_is_empty() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert!(matches!(
            response_text(parsed),
            Err(LlmError::EmptyResponse("gemini"))
        ));
    }

    #[test]
    fn test_missing_key_rejected() {
        let config = GeminiConfig {
            api_key: None,
            ..GeminiConfig::default()
        };
        assert!(matches!(
            GeminiGenerator::new(config),
            Err(LlmError::MissingApiKey("gemini"))
        ));
    }

    #[test]
    fn test_generate_url() {
        let config = GeminiConfig::default()
            .with_endpoint("https://proxy.local/")
            .with_api_key("k");
        let url = config.generate_url();
        assert!(url.starts_with("https://proxy.local/v1beta/models/"));
        assert!(url.ends_with(":generateContent"));
    }
}
