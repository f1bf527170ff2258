//! The generation capability consumed by the orchestrator.
//!
//! Backends (Ollama, Gemini, test doubles) implement [`Generator`]; the
//! orchestrator only ever sees `invoke(conversation) -> text`.

use async_trait::async_trait;

use crate::domain::{Conversation, GenerationError};

/// A text generator driven by a role-tagged conversation.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Short backend name for logs and the `CONNECTING` event.
    fn name(&self) -> &str;

    /// Produce one response for the full conversation so far.
    async fn invoke(&self, conversation: &Conversation) -> Result<String, GenerationError>;
}

/// Replays a fixed list of responses, one per call. Used in tests and demos.
///
/// Calls past the end of the script fail with [`GenerationError::Provider`].
#[derive(Debug, Default)]
pub struct ScriptedGenerator {
    responses: Vec<Result<String, GenerationError>>,
    calls: std::sync::Mutex<Vec<usize>>,
}

impl ScriptedGenerator {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: responses.into_iter().map(|r| Ok(r.into())).collect(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Script that includes failures.
    pub fn from_results(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Conversation length observed on each call, in call order.
    pub fn observed_lengths(&self) -> Vec<usize> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.observed_lengths().len()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn invoke(&self, conversation: &Conversation) -> Result<String, GenerationError> {
        let index = {
            let mut calls = self
                .calls
                .lock()
                .map_err(|_| GenerationError::Provider("script state poisoned".to_string()))?;
            calls.push(conversation.len());
            calls.len() - 1
        };

        match self.responses.get(index) {
            Some(response) => response.clone(),
            None => Err(GenerationError::Provider(format!(
                "script exhausted after {} responses",
                self.responses.len()
            ))),
        }
    }
}
