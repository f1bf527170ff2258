//! Generate → validate → retry loop.
//!
//! A run is a small state machine driven by the consumer of its event
//! stream: each poll advances it by exactly one transition and yields the
//! event for that transition. The generator is only called when the
//! consumer asks for the event after `PROCESSING`, so a slow or departed
//! consumer stalls the run instead of losing events.
//!
//! ```text
//! PROCESSING → VALIDATING → SUCCESS
//!                         → RETRY → PROCESSING ...
//!                         → ERROR   (budget exhausted)
//! PROCESSING → ERROR                (generator failure)
//! ```

use std::sync::Arc;
use std::time::Instant;

use futures::Stream;
use serde_json::json;
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::domain::Conversation;
use crate::events::{ProgressEvent, StreamStatus};
use crate::generator::Generator;
use crate::grammar::validate;
use crate::metrics::METRICS;
use crate::obs;
use crate::prompt::{correction_message, MINDMAP_INSTRUCTION};

/// Default attempt budget when none is configured.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

enum Phase {
    /// Announce the attempt.
    Processing,
    /// Call the generator.
    Invoking,
    /// Check the response the generator returned.
    Deciding(String),
    Done,
}

/// State of one generation run. Owns its conversation exclusively.
pub struct GenerationRun {
    run_id: String,
    generator: Arc<dyn Generator>,
    conversation: Conversation,
    attempt: u32,
    max_attempts: u32,
    remaining: u32,
    phase: Phase,
    started: Instant,
    span: tracing::Span,
}

impl GenerationRun {
    /// Seed a run for `source`. A budget of 0 is raised to 1.
    pub fn new(source: impl Into<String>, generator: Arc<dyn Generator>, max_attempts: u32) -> Self {
        let max_attempts = max_attempts.max(1);
        let run_id = Uuid::new_v4().to_string();
        let span = obs::run_span(&run_id);

        Self {
            run_id,
            generator,
            conversation: Conversation::seed(MINDMAP_INSTRUCTION, source),
            attempt: 1,
            max_attempts,
            remaining: max_attempts,
            phase: Phase::Processing,
            started: Instant::now(),
            span,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Turn the run into its lazy event stream. The stream can be consumed
    /// once; a new run is needed for another attempt sequence.
    pub fn into_stream(self) -> impl Stream<Item = ProgressEvent> + Send + 'static {
        obs::emit_run_started(&self.run_id, self.generator.name(), self.max_attempts);
        METRICS.inc_runs_started();

        futures::stream::unfold(self, |run| {
            let span = run.span.clone();
            run.step().instrument(span)
        })
    }

    /// Advance one transition.
    async fn step(mut self) -> Option<(ProgressEvent, Self)> {
        match std::mem::replace(&mut self.phase, Phase::Done) {
            Phase::Processing => {
                METRICS.inc_attempts();
                self.phase = Phase::Invoking;
                let event = ProgressEvent::with_data(
                    StreamStatus::Processing,
                    format!(
                        "Generating mind map (attempt {}/{})...",
                        self.attempt, self.max_attempts
                    ),
                    json!({ "attempt": self.attempt, "max_retries": self.max_attempts }),
                );
                Some((event, self))
            }
            Phase::Invoking => {
                debug!(
                    attempt = self.attempt,
                    messages = self.conversation.len(),
                    "invoking generator"
                );
                match self.generator.invoke(&self.conversation).await {
                    Ok(response) => {
                        self.phase = Phase::Deciding(response);
                        let event = ProgressEvent::with_data(
                            StreamStatus::Validating,
                            "Checking CTM format...",
                            json!({ "attempt": self.attempt }),
                        );
                        Some((event, self))
                    }
                    Err(err) => {
                        obs::emit_generation_failed(&self.run_id, self.attempt, &err);
                        self.finish(false);
                        let event = ProgressEvent::with_data(
                            StreamStatus::Error,
                            format!("Generation failed: {err}"),
                            json!({
                                "error": err.to_string(),
                                "attempt": self.attempt,
                                "attempts_used": self.attempt,
                            }),
                        );
                        Some((event, self))
                    }
                }
            }
            Phase::Deciding(response) => Some(self.decide(response)),
            Phase::Done => None,
        }
    }

    fn decide(mut self, response: String) -> (ProgressEvent, Self) {
        let outcome = validate(&response);
        obs::emit_attempt_validated(&self.run_id, self.attempt, outcome.is_valid);

        if outcome.is_valid {
            self.finish(true);
            let event = ProgressEvent::with_data(
                StreamStatus::Success,
                "Mind map generated successfully!",
                json!({
                    "ctm": response,
                    "attempts_used": self.attempt,
                    "validation_message": outcome.message,
                }),
            );
            return (event, self);
        }

        METRICS.inc_validation_failures();
        self.conversation.push_assistant(response);
        self.conversation
            .push_feedback(correction_message(&outcome.message));
        self.remaining -= 1;
        self.attempt += 1;

        if self.remaining > 0 {
            self.phase = Phase::Processing;
            let event = ProgressEvent::with_data(
                StreamStatus::Retry,
                format!(
                    "Invalid format, retrying ({}/{})...",
                    self.attempt, self.max_attempts
                ),
                json!({
                    "error": outcome.message,
                    "next_attempt": self.attempt,
                    "remaining_retries": self.remaining,
                }),
            );
            return (event, self);
        }

        self.finish(false);
        let event = ProgressEvent::with_data(
            StreamStatus::Error,
            format!(
                "Could not generate a mind map after {} attempts.",
                self.max_attempts
            ),
            json!({
                "last_error": outcome.message,
                "attempts_used": self.max_attempts,
            }),
        );
        (event, self)
    }

    fn finish(&mut self, success: bool) {
        self.phase = Phase::Done;
        if success {
            METRICS.inc_runs_succeeded();
        } else {
            METRICS.inc_runs_failed();
        }
        let attempts_used = self.attempt.min(self.max_attempts);
        obs::emit_run_finished(
            &self.run_id,
            self.started.elapsed().as_millis() as u64,
            attempts_used,
            success,
        );
    }
}

/// Run the generate → validate → retry loop for `source` and stream its
/// progress events. Exactly one `SUCCESS` or `ERROR` event ends the stream.
pub fn generate(
    source: impl Into<String>,
    generator: Arc<dyn Generator>,
    max_attempts: u32,
) -> impl Stream<Item = ProgressEvent> + Send + 'static {
    GenerationRun::new(source, generator, max_attempts).into_stream()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GenerationError;
    use crate::generator::ScriptedGenerator;
    use futures::StreamExt;

    const VALID: &str = "Root\n>Child\n>>Grandchild";
    const INVALID: &str = "Root\n>>Skipped";

    fn statuses(events: &[ProgressEvent]) -> Vec<StreamStatus> {
        events.iter().map(|e| e.status()).collect()
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let generator = Arc::new(ScriptedGenerator::new([VALID]));
        let events: Vec<_> = generate("text", generator, 3).collect().await;

        assert_eq!(
            statuses(&events),
            vec![
                StreamStatus::Processing,
                StreamStatus::Validating,
                StreamStatus::Success
            ]
        );
        let success = events.last().unwrap();
        assert_eq!(success.field("ctm"), Some(&json!(VALID)));
        assert_eq!(success.field("attempts_used"), Some(&json!(1)));
        assert_eq!(
            success.field("validation_message"),
            Some(&json!("Valid CTM format with 3 nodes."))
        );
    }

    #[tokio::test]
    async fn test_generator_failure_is_terminal() {
        let generator = Arc::new(ScriptedGenerator::from_results(vec![Err(
            GenerationError::Http("connection refused".to_string()),
        )]));
        let events: Vec<_> = generate("text", generator.clone(), 3).collect().await;

        assert_eq!(
            statuses(&events),
            vec![StreamStatus::Processing, StreamStatus::Error]
        );
        assert_eq!(generator.call_count(), 1);
        let msg = events[1].field("error").and_then(|v| v.as_str()).unwrap();
        assert!(msg.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_zero_budget_still_makes_one_attempt() {
        let generator = Arc::new(ScriptedGenerator::new([INVALID]));
        let events: Vec<_> = generate("text", generator, 0).collect().await;

        assert_eq!(events.last().unwrap().status(), StreamStatus::Error);
        assert_eq!(events.last().unwrap().field("attempts_used"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn test_retry_payload() {
        let generator = Arc::new(ScriptedGenerator::new([INVALID, VALID]));
        let events: Vec<_> = generate("text", generator, 3).collect().await;

        let retry = &events[2];
        assert_eq!(retry.status(), StreamStatus::Retry);
        assert_eq!(retry.field("next_attempt"), Some(&json!(2)));
        assert_eq!(retry.field("remaining_retries"), Some(&json!(2)));
        let error = retry.field("error").and_then(|v| v.as_str()).unwrap();
        assert!(error.contains("Jumped from level 0 to level 2"));
    }

    #[tokio::test]
    async fn test_generator_not_called_until_polled() {
        let generator = Arc::new(ScriptedGenerator::new([VALID]));
        let stream = generate("text", generator.clone(), 3);
        futures::pin_mut!(stream);

        let first = stream.next().await.unwrap();
        assert_eq!(first.status(), StreamStatus::Processing);
        assert_eq!(generator.call_count(), 0);

        let second = stream.next().await.unwrap();
        assert_eq!(second.status(), StreamStatus::Validating);
        assert_eq!(generator.call_count(), 1);
    }
}
