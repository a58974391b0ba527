use crate::record::{ContextMap, LogRecord};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Version of the on-disk field layout below. Bump on any change to
/// [`FIELD_NAMES`] or their order.
pub const FORMAT_VERSION: u32 = 1;

/// Field names in their written order.
pub const FIELD_NAMES: [&str; 13] = [
    "Timestamp",
    "Message",
    "Location",
    "Product",
    "LumberJackException",
    "ElapsedMilliseconds",
    "Exception",
    "Hostname",
    "PartId",
    "UserName",
    "CorrelationId",
    "AdditionalInfo",
    "EnvironmentName",
];

/// Message template stored next to each written entry.
pub const MESSAGE_TEMPLATE: &str = "{Timestamp}|{Message}|{Location}|{Product}|\
{LumberJackException}|{ElapsedMilliseconds}|{Exception}|{Hostname}|\
{PartId}|{UserName}|{CorrelationId}|{AdditionalInfo}|{EnvironmentName}";

/// Per-service values stamped onto every entry.
#[derive(Debug, Clone, Default)]
pub struct ServiceStamp {
    pub product: String,
    pub hostname: String,
    pub environment_name: String,
}

/// The fixed set of fields handed to a sink.
///
/// Serialization order follows declaration order, which matches
/// [`FIELD_NAMES`].
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct TemplateFields {
    pub timestamp: DateTime<Utc>,
    pub message: Option<String>,
    pub location: String,
    pub product: String,
    pub lumber_jack_exception: Option<String>,
    pub elapsed_milliseconds: Option<i64>,
    pub exception: Option<String>,
    pub hostname: String,
    pub part_id: i32,
    pub user_name: String,
    pub correlation_id: Option<String>,
    pub additional_info: ContextMap,
    pub environment_name: String,
}

impl TemplateFields {
    pub fn from_record(record: &LogRecord, stamp: &ServiceStamp) -> Self {
        let message = if record.message.is_empty() {
            None
        } else {
            Some(record.message.clone())
        };

        TemplateFields {
            timestamp: record.timestamp,
            message,
            location: record.location.clone(),
            product: stamp.product.clone(),
            lumber_jack_exception: record.exception_type.clone(),
            elapsed_milliseconds: record.elapsed_millis,
            exception: record.exception_trace.clone(),
            hostname: stamp.hostname.clone(),
            part_id: record.identity.part_id,
            user_name: record.identity.user_name.clone(),
            correlation_id: record.correlation_id.clone(),
            additional_info: record.context.clone(),
            environment_name: stamp.environment_name.clone(),
        }
    }

    /// Single-line rendering of [`MESSAGE_TEMPLATE`]. Absent values render
    /// empty; `AdditionalInfo` renders as compact JSON.
    pub fn render_line(&self) -> String {
        let additional =
            serde_json::to_string(&self.additional_info).unwrap_or_else(|_| "{}".to_string());
        [
            self.timestamp.to_rfc3339(),
            self.message.clone().unwrap_or_default(),
            self.location.clone(),
            self.product.clone(),
            self.lumber_jack_exception.clone().unwrap_or_default(),
            self.elapsed_milliseconds.map(|ms| ms.to_string()).unwrap_or_default(),
            self.exception.clone().unwrap_or_default(),
            self.hostname.clone(),
            self.part_id.to_string(),
            self.user_name.clone(),
            self.correlation_id.clone().unwrap_or_default(),
            additional,
            self.environment_name.clone(),
        ]
        .join("|")
    }
}
