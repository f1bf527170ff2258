//! CTM Mindmap Core Library
//!
//! Grammar validation for CTM (Compact Tree Markup) and the
//! generate → validate → retry loop that drives an LLM toward valid output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use mindmap_core::{generate, Generator};
//!
//! let generator: Arc<dyn Generator> = build_backend()?;
//! let mut events = Box::pin(generate(article_text, generator, 3));
//! while let Some(event) = events.next().await {
//!     print!("{}", event.to_ndjson());
//! }
//! ```

pub mod config;
pub mod domain;
pub mod events;
pub mod generator;
pub mod grammar;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod prompt;
pub mod telemetry;

pub use config::Settings;
pub use domain::{
    render_document, ConfigError, Conversation, CtmDocument, CtmError, CtmNode, GenerationError,
    Message, MindmapError, Result, Role,
};
pub use events::{write_ndjson, ProgressEvent, StreamStatus};
pub use generator::{Generator, ScriptedGenerator};
pub use grammar::{
    is_valid_ctm, parse_document, parse_with_report, strip_fence, validate, ParseReport,
    ValidationOutcome,
};
pub use metrics::{MetricsSnapshot, METRICS};
pub use obs::{
    emit_attempt_validated, emit_generation_failed, emit_run_finished, emit_run_started, run_span,
};
pub use orchestrator::{generate, GenerationRun, DEFAULT_MAX_ATTEMPTS};
pub use prompt::{correction_message, MINDMAP_INSTRUCTION};
pub use telemetry::init_tracing;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
