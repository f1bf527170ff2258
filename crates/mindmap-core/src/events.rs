//! Progress events streamed to the transport layer.
//!
//! One event per state transition. Events are rendered as NDJSON: one
//! `{"status", "message", "data"}` object per line, in emission order.

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Stage of a generation run as seen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StreamStatus {
    // Connection & preparation
    Connecting,
    Preparing,

    // Input processing
    ReadingFile,
    LoadingWeb,
    ExtractingText,

    // Generation
    Processing,
    Validating,
    Retry,

    // Final states
    Success,
    Error,
}

impl StreamStatus {
    /// `SUCCESS` and `ERROR` end a run; nothing may follow them.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamStatus::Success | StreamStatus::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StreamStatus::Connecting => "CONNECTING",
            StreamStatus::Preparing => "PREPARING",
            StreamStatus::ReadingFile => "READING_FILE",
            StreamStatus::LoadingWeb => "LOADING_WEB",
            StreamStatus::ExtractingText => "EXTRACTING_TEXT",
            StreamStatus::Processing => "PROCESSING",
            StreamStatus::Validating => "VALIDATING",
            StreamStatus::Retry => "RETRY",
            StreamStatus::Success => "SUCCESS",
            StreamStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single progress update. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    status: StreamStatus,
    message: String,
    data: Option<Map<String, Value>>,
}

impl ProgressEvent {
    pub fn new(status: StreamStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            data: None,
        }
    }

    /// Build an event with a payload. Non-object values are wrapped under
    /// a `"value"` key.
    pub fn with_data(status: StreamStatus, message: impl Into<String>, data: Value) -> Self {
        let data = match data {
            Value::Object(map) => map,
            Value::Null => return Self::new(status, message),
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self {
            status,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn status(&self) -> StreamStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Look up one payload field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|d| d.get(key))
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Serialize as one NDJSON line, trailing newline included.
    pub fn to_ndjson(&self) -> String {
        // Serializing a String-keyed map of JSON values cannot fail.
        let mut line = serde_json::to_string(self).unwrap_or_default();
        line.push('\n');
        line
    }
}

/// Write every event of `events` to `writer` as NDJSON, flushing after each
/// line. Returns the last event written.
pub async fn write_ndjson<S, W>(events: S, writer: &mut W) -> std::io::Result<Option<ProgressEvent>>
where
    S: Stream<Item = ProgressEvent>,
    W: AsyncWrite + Unpin,
{
    futures::pin_mut!(events);
    let mut last = None;
    while let Some(event) = events.next().await {
        writer.write_all(event.to_ndjson().as_bytes()).await?;
        writer.flush().await?;
        last = Some(event);
    }
    Ok(last)
}
