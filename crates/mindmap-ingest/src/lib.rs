//! Mindmap-Ingest: text sources for CTM mind-map generation
//!
//! Accepts raw text, PDF bytes or a web URL, turns it into article text and
//! feeds the generation loop, streaming progress events along the way.

pub mod error;
pub mod pdf;
pub mod pipeline;
pub mod web;

pub use error::SourceError;
pub use pdf::{extract_pdf_text, extract_pdf_text_blocking, MAX_PDF_BYTES};
pub use pipeline::{stream_from_source, TextSource};
pub use web::{extract_readable, HttpPageFetcher, PageFetcher};
