use crate::record::Severity;
use crate::sink::{LogSink, SinkError};
use crate::template::TemplateFields;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

/// Path of the event endpoint, relative to the collector base URL.
pub const EVENT_PATH: &str = "services/collector/event";

/// Configuration for [`EventCollectorSink`].
///
/// The sink talks to an HTTP event collector, one JSON event per request.
/// `source` distinguishes the channel (usage, perf, error, diag) when all
/// channels share one collector.
#[derive(Clone, Debug)]
pub struct EventCollectorConfig {
    /// Base URL without path, e.g. "https://collector.example.com:8088"
    pub url: String,
    pub token: String,
    pub source: String,
    pub hostname: String,
}

/// Event collector implementation of [`LogSink`].
///
/// Each write is a single POST; failures are returned to the caller and
/// never retried here.
#[derive(Clone)]
pub struct EventCollectorSink {
    client: Client,
    config: EventCollectorConfig,
}

#[derive(Serialize, Debug)]
struct CollectorEvent<'a> {
    time: f64,
    host: &'a str,
    source: &'a str,
    sourcetype: &'static str,
    event: CollectorPayload<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct CollectorPayload<'a> {
    level: Severity,
    rendered_message: String,
    properties: &'a TemplateFields,
}

impl EventCollectorSink {
    /// Construct a new sink instance using the provided configuration.
    pub fn new(config: EventCollectorConfig) -> Self {
        let client = Client::new();
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.config.url.trim_end_matches('/'), EVENT_PATH)
    }

    fn map_event<'a>(&'a self, severity: Severity, fields: &'a TemplateFields) -> CollectorEvent<'a> {
        CollectorEvent {
            time: fields.timestamp.timestamp_millis() as f64 / 1000.0,
            host: &self.config.hostname,
            source: &self.config.source,
            sourcetype: "_json",
            event: CollectorPayload {
                level: severity,
                rendered_message: fields.render_line(),
                properties: fields,
            },
        }
    }
}

#[async_trait]
impl LogSink for EventCollectorSink {
    async fn write(&self, severity: Severity, fields: &TemplateFields) -> Result<(), SinkError> {
        let body = serde_json::to_string(&self.map_event(severity, fields))?;
        let resp = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Splunk {}", self.config.token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
            tracing::warn!(status, source = %self.config.source, "event collector rejected log entry");
            Err(SinkError::Rejected { status, body })
        }
    }
}
