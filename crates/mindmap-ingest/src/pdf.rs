//! PDF text extraction

use tracing::{debug, warn};

use crate::error::SourceError;

/// Largest PDF accepted, in bytes.
pub const MAX_PDF_BYTES: usize = 10 * 1024 * 1024;

/// Extract the text of every page, in page order.
///
/// The decoder is run under `catch_unwind`; malformed files that make it
/// panic are reported as [`SourceError::InvalidPdf`].
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, SourceError> {
    if bytes.len() > MAX_PDF_BYTES {
        return Err(SourceError::TooLarge {
            size: bytes.len(),
            limit: MAX_PDF_BYTES,
        });
    }

    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes)) {
        Ok(Ok(text)) => {
            debug!(bytes = bytes.len(), chars = text.len(), "PDF text extracted");
            Ok(text)
        }
        Ok(Err(e)) => Err(SourceError::InvalidPdf(e.to_string())),
        Err(_) => {
            warn!(bytes = bytes.len(), "PDF decoder panicked");
            Err(SourceError::InvalidPdf("decoder failed on malformed input".to_string()))
        }
    }
}

/// [`extract_pdf_text`] on the blocking pool.
pub async fn extract_pdf_text_blocking(bytes: Vec<u8>) -> Result<String, SourceError> {
    if bytes.len() > MAX_PDF_BYTES {
        return Err(SourceError::TooLarge {
            size: bytes.len(),
            limit: MAX_PDF_BYTES,
        });
    }
    tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
        .await
        .map_err(|e| SourceError::InvalidPdf(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oversized_rejected_before_decoding() {
        let bytes = vec![0u8; MAX_PDF_BYTES + 1];
        assert_eq!(
            extract_pdf_text(&bytes),
            Err(SourceError::TooLarge {
                size: MAX_PDF_BYTES + 1,
                limit: MAX_PDF_BYTES
            })
        );
    }

    #[test]
    fn test_garbage_is_invalid_pdf() {
        let err = extract_pdf_text(b"definitely not a pdf").unwrap_err();
        assert_eq!(err.kind(), "invalid_pdf");
    }

    #[tokio::test]
    async fn test_blocking_variant_reports_same_errors() {
        let err = extract_pdf_text_blocking(b"%PDF-1.4 truncated".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_pdf");
    }
}
