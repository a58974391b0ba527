use crate::record::Severity;
use crate::sink::{LogSink, SinkError};
use crate::template::TemplateFields;
use async_trait::async_trait;

/// A sink that simply drops all entries.
///
/// Useful for channels a service does not care about, and for measuring
/// the enrichment overhead without any I/O.
#[derive(Clone, Default)]
pub struct NoopSink;

#[async_trait]
impl LogSink for NoopSink {
    async fn write(&self, _severity: Severity, _fields: &TemplateFields) -> Result<(), SinkError> {
        Ok(())
    }
}
