use crate::record::Severity;
use crate::template::TemplateFields;
use async_trait::async_trait;

/// Error returned by a [`LogSink`] when a record could not be persisted.
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("i/o error writing log entry: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize log entry: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("event collector transport error: {0}")]
    Transport(String),

    #[error("event collector rejected entry with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for finished log entries, one per channel.
///
/// Implementations are responsible for transporting the fields to a
/// concrete backend (JSON file, event collector, memory, etc) and for
/// serializing their own concurrent writes. The router awaits `write`
/// on the caller's task and surfaces any error unchanged; there is no
/// retry on top of a sink.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Persist a single entry.
    ///
    /// **Parameters**
    /// - `severity`: level the entry is written at.
    /// - `fields`: the fixed template fields of the entry.
    ///
    /// **Returns**
    /// - `Ok(())` if the backend accepted the entry.
    /// - `Err(..)` on I/O, serialization or transport failure.
    async fn write(&self, severity: Severity, fields: &TemplateFields) -> Result<(), SinkError>;

    /// Flush any buffered entries, if the backend implements buffering.
    ///
    /// Default implementation is a no-op.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
