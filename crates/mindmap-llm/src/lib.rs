//! Mindmap-LLM: generation backends for CTM mind maps
//!
//! Implements [`mindmap_core::Generator`] for a local Ollama server and for
//! Google Gemini. The orchestrator only sees the trait object returned by
//! [`build_generator`].

pub mod error;
pub mod gemini;
pub mod ollama;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use mindmap_core::Generator;
use serde::{Deserialize, Serialize};
use tracing::info;

pub use error::LlmError;
pub use gemini::{GeminiConfig, GeminiGenerator};
pub use ollama::{OllamaConfig, OllamaGenerator};

/// Result type for backend operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Environment variable selecting the default backend
pub const LLM_TYPE_ENV: &str = "MINDMAP_LLM";

/// Which backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmType {
    #[default]
    Ollama,
    Gemini,
}

impl LlmType {
    pub fn as_str(self) -> &'static str {
        match self {
            LlmType::Ollama => "ollama",
            LlmType::Gemini => "gemini",
        }
    }
}

impl std::fmt::Display for LlmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmType {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Ok(LlmType::Ollama),
            "gemini" => Ok(LlmType::Gemini),
            other => Err(LlmError::UnknownBackend(other.to_string())),
        }
    }
}

/// Backend selection for one generation request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmConfig {
    pub llm_type: LlmType,
    /// Overrides the key taken from the environment (Gemini only)
    pub api_key: Option<String>,
}

impl LlmConfig {
    pub fn new(llm_type: LlmType) -> Self {
        LlmConfig {
            llm_type,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Construct the generator named by `config`
pub fn build_generator(config: &LlmConfig) -> Result<Arc<dyn Generator>> {
    info!(backend = %config.llm_type, "Building generation backend");
    match config.llm_type {
        LlmType::Ollama => Ok(Arc::new(OllamaGenerator::from_env()?)),
        LlmType::Gemini => {
            let mut gemini = GeminiConfig::from_env();
            if let Some(key) = config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
                gemini = gemini.with_api_key(key);
            }
            Ok(Arc::new(GeminiGenerator::new(gemini)?))
        }
    }
}

pub(crate) fn build_http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("mindmap-llm/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}
