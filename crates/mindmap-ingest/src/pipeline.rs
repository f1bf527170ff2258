//! Source-aware event pipeline.
//!
//! Turns a [`TextSource`] into text, announcing each step as a progress
//! event, then hands the text to the generate → validate → retry loop.
//! Source failures end the stream with a single `ERROR` event.

use std::sync::Arc;

use futures::stream::{self, BoxStream, StreamExt};
use mindmap_core::{generate, Generator, ProgressEvent, StreamStatus};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::error::SourceError;
use crate::pdf::extract_pdf_text_blocking;
use crate::web::{extract_readable, PageFetcher};

/// Where the article text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextSource {
    Text(String),
    Pdf { bytes: Vec<u8>, filename: String },
    Url(String),
}

/// Stream the full event sequence for `source`, starting with `CONNECTING`.
pub fn stream_from_source(
    source: TextSource,
    generator: Arc<dyn Generator>,
    fetcher: Arc<dyn PageFetcher>,
    max_attempts: u32,
) -> BoxStream<'static, ProgressEvent> {
    let provider = generator.name().to_string();
    let connecting = ProgressEvent::with_data(
        StreamStatus::Connecting,
        format!("Connecting to {provider}..."),
        json!({ "provider": provider }),
    );

    let body = match source {
        TextSource::Text(text) => from_text(text, generator, max_attempts),
        TextSource::Pdf { bytes, filename } => from_pdf(bytes, filename, generator, max_attempts),
        TextSource::Url(url) => from_url(url, generator, fetcher, max_attempts),
    };

    stream::iter([connecting]).chain(body).boxed()
}

fn from_text(
    text: String,
    generator: Arc<dyn Generator>,
    max_attempts: u32,
) -> BoxStream<'static, ProgressEvent> {
    let preparing = ProgressEvent::with_data(
        StreamStatus::Preparing,
        "Preparing content...",
        json!({ "text_length": text.chars().count() }),
    );
    stream::iter([preparing])
        .chain(generate(text, generator, max_attempts))
        .boxed()
}

fn from_pdf(
    bytes: Vec<u8>,
    filename: String,
    generator: Arc<dyn Generator>,
    max_attempts: u32,
) -> BoxStream<'static, ProgressEvent> {
    let reading = ProgressEvent::with_data(
        StreamStatus::ReadingFile,
        format!("Reading {filename}..."),
        json!({ "filename": filename, "size": bytes.len() }),
    );

    let rest = stream::once(async move {
        match extract_pdf_text_blocking(bytes).await {
            Ok(text) => {
                let extracted = ProgressEvent::with_data(
                    StreamStatus::ExtractingText,
                    format!("Extracted text from {filename}..."),
                    json!({ "text_length": text.chars().count(), "filename": filename }),
                );
                stream::iter([extracted])
                    .chain(generate(text, generator, max_attempts))
                    .boxed()
            }
            Err(err) => single(source_error_event(&err, [("filename", json!(filename))])),
        }
    })
    .flatten();

    stream::iter([reading]).chain(rest).boxed()
}

fn from_url(
    url: String,
    generator: Arc<dyn Generator>,
    fetcher: Arc<dyn PageFetcher>,
    max_attempts: u32,
) -> BoxStream<'static, ProgressEvent> {
    let loading = ProgressEvent::with_data(
        StreamStatus::LoadingWeb,
        format!("Loading content from {url}..."),
        json!({ "url": url }),
    );

    let rest = stream::once(async move {
        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(err) => return single(source_error_event(&err, [("url", json!(url))])),
        };

        let extracting = ProgressEvent::with_data(
            StreamStatus::ExtractingText,
            "Extracting content from the web page...",
            json!({ "url": url }),
        );
        let outcome = stream::once(async move {
            match extract_readable(&html) {
                Some(text) => generate(text, generator, max_attempts).boxed(),
                None => {
                    let err = SourceError::NoContent { url: url.clone() };
                    single(source_error_event(&err, [("url", json!(url))]))
                }
            }
        })
        .flatten();

        stream::iter([extracting]).chain(outcome).boxed()
    })
    .flatten();

    stream::iter([loading]).chain(rest).boxed()
}

fn single(event: ProgressEvent) -> BoxStream<'static, ProgressEvent> {
    stream::iter([event]).boxed()
}

fn source_error_event<const N: usize>(
    err: &SourceError,
    extra: [(&str, Value); N],
) -> ProgressEvent {
    warn!(kind = err.kind(), error = %err, "Source could not be read");

    let mut data = Map::new();
    data.insert("error".to_string(), json!(err.to_string()));
    data.insert("kind".to_string(), json!(err.kind()));
    for (key, value) in extra {
        data.insert(key.to_string(), value);
    }
    ProgressEvent::with_data(StreamStatus::Error, err.to_string(), Value::Object(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mindmap_core::ScriptedGenerator;

    struct NoFetch;

    #[async_trait]
    impl PageFetcher for NoFetch {
        async fn fetch(&self, url: &str) -> Result<String, SourceError> {
            Err(SourceError::FetchFailed {
                url: url.to_string(),
                reason: "offline".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_text_source_prepares_then_generates() {
        let generator = Arc::new(ScriptedGenerator::new(["Root\n>Child"]));
        let events: Vec<_> = stream_from_source(
            TextSource::Text("Bài viết".to_string()),
            generator,
            Arc::new(NoFetch),
            3,
        )
        .collect()
        .await;

        let statuses: Vec<_> = events.iter().map(|e| e.status()).collect();
        assert_eq!(
            statuses,
            vec![
                StreamStatus::Connecting,
                StreamStatus::Preparing,
                StreamStatus::Processing,
                StreamStatus::Validating,
                StreamStatus::Success
            ]
        );
        assert_eq!(events[0].field("provider"), Some(&json!("scripted")));
        assert_eq!(events[1].field("text_length"), Some(&json!(8)));
    }

    #[test]
    fn test_source_error_event_shape() {
        let err = SourceError::InvalidPdf("bad header".into());
        let event = source_error_event(&err, [("filename", json!("a.pdf"))]);
        assert_eq!(event.status(), StreamStatus::Error);
        assert_eq!(event.field("kind"), Some(&json!("invalid_pdf")));
        assert_eq!(event.field("filename"), Some(&json!("a.pdf")));
        assert_eq!(event.message(), "Invalid PDF file: bad header");
    }
}
