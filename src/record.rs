use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Flat key/value context attached to a [`LogRecord`].
///
/// A `BTreeMap` keeps iteration order deterministic, so two merges of the
/// same inputs serialize byte-for-byte identically.
pub type ContextMap = BTreeMap<String, serde_json::Value>;

/// Logical category of a log call. Determines channel and severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Usage,
    Performance,
    Error,
    Diagnostic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Usage => "Usage",
            Self::Performance => "Performance",
            Self::Error => "Error",
            Self::Diagnostic => "Diagnostic",
        }
    }

    /// Severity the record is written at. Only errors are elevated.
    pub fn severity(&self) -> Severity {
        match self {
            Self::Error => Severity::Error,
            _ => Severity::Information,
        }
    }

    /// Prefix applied to keys of the caller-supplied context map.
    ///
    /// Usage calls namespace caller keys under `Info-`; every other
    /// category stores them bare.
    pub fn caller_key_prefix(&self) -> &'static str {
        match self {
            Self::Usage => "Info-",
            _ => "",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity handed to a sink alongside the template fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Information,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Information => "Information",
            Self::Error => "Error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a record is about, resolved once per record from the ambient claims.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub part_id: i32,
    pub user_name: String,
}

/// Canonical enriched log entry.
///
/// Built by [`crate::builder::LogRecordBuilder`], consumed once by the
/// router and then dropped. Fields are read-only outside the crate.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) category: Category,
    pub(crate) message: String,
    pub(crate) location: String,
    pub(crate) correlation_id: Option<String>,
    pub(crate) elapsed_millis: Option<i64>,
    pub(crate) exception_type: Option<String>,
    pub(crate) exception_trace: Option<String>,
    pub(crate) context: ContextMap,
    pub(crate) identity: Identity,
}

impl LogRecord {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn elapsed_millis(&self) -> Option<i64> {
        self.elapsed_millis
    }

    /// Type name of the outermost exception, if one was supplied.
    pub fn exception_type(&self) -> Option<&str> {
        self.exception_type.as_deref()
    }

    pub fn exception_trace(&self) -> Option<&str> {
        self.exception_trace.as_deref()
    }

    pub fn context(&self) -> &ContextMap {
        &self.context
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }
}
