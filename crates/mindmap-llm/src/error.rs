//! Error types for mindmap-llm

use mindmap_core::GenerationError;
use thiserror::Error;

/// Errors that can occur while talking to a generation backend
#[derive(Error, Debug)]
pub enum LlmError {
    /// Request could not be sent or the response could not be read
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider answered with a non-success status
    #[error("{provider} API returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Provider answered but produced no text
    #[error("{0} returned an empty response")]
    EmptyResponse(&'static str),

    /// Backend requires an API key and none was supplied
    #[error("{0} requires an API key")]
    MissingApiKey(&'static str),

    /// Unknown backend name
    #[error("unknown LLM type: {0}")]
    UnknownBackend(String),

    /// Response body was not the expected JSON shape
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

impl From<LlmError> for GenerationError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Http(msg) => GenerationError::Http(msg),
            LlmError::EmptyResponse(_) => GenerationError::EmptyResponse,
            LlmError::MissingApiKey(_) | LlmError::UnknownBackend(_) => {
                GenerationError::Configuration(err.to_string())
            }
            LlmError::Api { .. } | LlmError::Json(_) => GenerationError::Provider(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_maps_to_provider() {
        let err = LlmError::Api {
            provider: "ollama",
            status: 404,
            body: "model 'x' not found".to_string(),
        };
        let gen: GenerationError = err.into();
        match gen {
            GenerationError::Provider(msg) => {
                assert!(msg.contains("404"));
                assert!(msg.contains("model 'x' not found"));
            }
            other => panic!("Expected Provider, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_and_config_mapping() {
        assert_eq!(
            GenerationError::from(LlmError::EmptyResponse("gemini")),
            GenerationError::EmptyResponse
        );
        assert!(matches!(
            GenerationError::from(LlmError::MissingApiKey("gemini")),
            GenerationError::Configuration(_)
        ));
    }
}
