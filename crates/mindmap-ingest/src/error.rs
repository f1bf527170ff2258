//! Error types for mindmap-ingest

use thiserror::Error;

/// Reasons a source could not be turned into text.
///
/// None of these are retried: they are input problems, not generation
/// problems.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("File too large ({size} bytes). Max size is {} MB", .limit / (1024 * 1024))]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid PDF file: {0}")]
    InvalidPdf(String),

    #[error("Could not load web page {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Could not extract content from URL: {url}")]
    NoContent { url: String },
}

impl SourceError {
    /// Stable tag used in the `kind` field of `ERROR` events
    pub fn kind(&self) -> &'static str {
        match self {
            SourceError::TooLarge { .. } => "too_large",
            SourceError::InvalidPdf(_) => "invalid_pdf",
            SourceError::FetchFailed { .. } => "fetch_failed",
            SourceError::NoContent { .. } => "no_content",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_distinct() {
        let errors = [
            SourceError::TooLarge { size: 1, limit: 0 },
            SourceError::InvalidPdf("bad xref".into()),
            SourceError::FetchFailed {
                url: "http://x".into(),
                reason: "timeout".into(),
            },
            SourceError::NoContent {
                url: "http://x".into(),
            },
        ];
        let kinds: Vec<_> = errors.iter().map(SourceError::kind).collect();
        assert_eq!(kinds, vec!["too_large", "invalid_pdf", "fetch_failed", "no_content"]);
    }

    #[test]
    fn test_too_large_message_in_megabytes() {
        let err = SourceError::TooLarge {
            size: 11 * 1024 * 1024,
            limit: 10 * 1024 * 1024,
        };
        assert!(err.to_string().ends_with("Max size is 10 MB"));
    }
}
