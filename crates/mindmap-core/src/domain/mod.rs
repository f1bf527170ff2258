//! Domain models for CTM mind-map generation.
//!
//! - `CtmDocument` / `CtmNode`: typed outline parsed from CTM text
//! - `Conversation`: role-tagged message log for one generation run
//! - `error`: grammar, generation and configuration failures

pub mod conversation;
pub mod document;
pub mod error;

pub use conversation::{Conversation, Message, Role};
pub use document::{render_document, CtmDocument, CtmNode};
pub use error::{ConfigError, CtmError, GenerationError, MindmapError, Result};
