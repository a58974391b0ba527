use serde_json::Value;
use std::error::Error;

/// Maximum number of links followed along an inner-exception chain.
///
/// Every walk over a chain (flattening, deepest-message lookup,
/// `Procedure` lookup) stops here, so a cyclic chain cannot recurse forever.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Data-bag key whose value overrides the record location.
pub const PROCEDURE_KEY: &str = "Procedure";

/// Auxiliary field names never printed as `name : value` lines. The first
/// five have dedicated lines or accessors; `HelpLink` and `TargetSite`
/// are noise.
pub const EXCLUDED_FIELDS: [&str; 7] = [
    "StackTrace",
    "Message",
    "InnerException",
    "Data",
    "HelpLink",
    "Source",
    "TargetSite",
];

/// Rendered value of an auxiliary exception field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    /// Sequence-valued field, rendered as its elements joined by `|`.
    List(Vec<String>),
    /// The value could not be read; rendered as an empty string.
    Unavailable,
}

impl FieldValue {
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join("|"),
            Self::Unavailable => String::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Read-only view of an exception that can be flattened and mined for
/// context.
///
/// Implementors list their own auxiliary fields in `extra_fields`, in the
/// order they should be printed. Names in [`EXCLUDED_FIELDS`] are skipped
/// when flattening.
pub trait ExceptionInfo: Send + Sync {
    fn type_name(&self) -> &str;

    fn message(&self) -> &str;

    fn extra_fields(&self) -> Vec<(String, FieldValue)> {
        Vec::new()
    }

    fn source(&self) -> Option<&str> {
        None
    }

    fn stack_trace(&self) -> Option<&str> {
        None
    }

    /// Associated key/value data bag. `Value::Null` marks an absent value.
    fn data(&self) -> &[(String, Value)] {
        &[]
    }

    fn inner(&self) -> Option<&dyn ExceptionInfo> {
        None
    }
}

/// Walks the chain outer-to-inner, at most [`MAX_CHAIN_DEPTH`] links deep.
pub fn chain(exception: &dyn ExceptionInfo) -> impl Iterator<Item = &dyn ExceptionInfo> {
    std::iter::successors(Some(exception), |&e| e.inner()).take(MAX_CHAIN_DEPTH + 1)
}

/// Message of the deepest exception reachable within the depth guard.
pub fn deepest_message(exception: &dyn ExceptionInfo) -> &str {
    chain(exception)
        .last()
        .map(|e| e.message())
        .unwrap_or_else(|| exception.message())
}

/// First non-empty `Procedure` data entry, searched outer-to-inner.
pub fn find_procedure(exception: &dyn ExceptionInfo) -> Option<String> {
    chain(exception).find_map(|e| {
        e.data()
            .iter()
            .filter(|(key, _)| key == PROCEDURE_KEY)
            .find_map(|(_, value)| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                _ => None,
            })
    })
}

/// Owned exception value for callers that do not have their own
/// [`ExceptionInfo`] type.
///
/// ```
/// use lumberjack::exception::LoggedError;
///
/// let err = LoggedError::new("SqlException", "deadlock victim")
///     .with_field("Number", "1205")
///     .with_data("Procedure", "Orders.Insert")
///     .with_inner(LoggedError::new("IoError", "connection reset"));
/// assert!(err.inner_error().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggedError {
    type_name: String,
    message: String,
    fields: Vec<(String, FieldValue)>,
    source: Option<String>,
    stack_trace: Option<String>,
    data: Vec<(String, Value)>,
    inner: Option<Box<LoggedError>>,
}

impl LoggedError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            ..Default::default()
        }
    }

    /// Converts a `std::error::Error` and its `source()` chain.
    ///
    /// The outermost link is named after `E`. Sources are only known as
    /// trait objects: common std errors are recognised by downcasting,
    /// others are named from a derived-looking `Debug` output
    /// (`Name { .. }`, `Name(..)` or `Name`), falling back to `"Error"`.
    pub fn from_error<E: Error + 'static>(err: &E) -> Self {
        let mut links: Vec<&(dyn Error + 'static)> = Vec::new();
        let mut current: Option<&(dyn Error + 'static)> = err.source();
        while let Some(e) = current {
            if links.len() >= MAX_CHAIN_DEPTH {
                break;
            }
            links.push(e);
            current = e.source();
        }

        let inner = links.into_iter().rev().fold(None::<LoggedError>, |inner, e| {
            let mut link = LoggedError::new(source_type_name(e), e.to_string());
            link.inner = inner.map(Box::new);
            Some(link)
        });

        let mut outer = LoggedError::new(std::any::type_name::<E>(), err.to_string());
        outer.inner = inner.map(Box::new);
        outer
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_stack_trace(mut self, stack_trace: impl Into<String>) -> Self {
        self.stack_trace = Some(stack_trace.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.push((key.into(), value.into()));
        self
    }

    pub fn with_inner(mut self, inner: LoggedError) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    pub fn inner_error(&self) -> Option<&LoggedError> {
        self.inner.as_deref()
    }
}

const FALLBACK_TYPE_NAME: &str = "Error";

fn source_type_name(e: &(dyn Error + 'static)) -> String {
    let known = if e.is::<std::io::Error>() {
        Some("std::io::Error")
    } else if e.is::<serde_json::Error>() {
        Some("serde_json::Error")
    } else if e.is::<std::num::ParseIntError>() {
        Some("std::num::ParseIntError")
    } else if e.is::<std::num::ParseFloatError>() {
        Some("std::num::ParseFloatError")
    } else if e.is::<std::str::Utf8Error>() {
        Some("std::str::Utf8Error")
    } else if e.is::<std::string::FromUtf8Error>() {
        Some("std::string::FromUtf8Error")
    } else if e.is::<std::fmt::Error>() {
        Some("std::fmt::Error")
    } else {
        None
    };
    match known {
        Some(name) => name.to_string(),
        None => debug_type_name(&format!("{:?}", e)),
    }
}

fn debug_type_name(debug: &str) -> String {
    let name_len = debug
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == ':'))
        .unwrap_or(debug.len());
    let (name, rest) = debug.split_at(name_len);
    let looks_like_type = name.chars().next().map_or(false, char::is_uppercase)
        && (rest.is_empty() || rest.starts_with('(') || rest.starts_with(" {"));
    if looks_like_type {
        name.to_string()
    } else {
        FALLBACK_TYPE_NAME.to_string()
    }
}

impl ExceptionInfo for LoggedError {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn extra_fields(&self) -> Vec<(String, FieldValue)> {
        self.fields.clone()
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn stack_trace(&self) -> Option<&str> {
        self.stack_trace.as_deref()
    }

    fn data(&self) -> &[(String, Value)] {
        &self.data
    }

    fn inner(&self) -> Option<&dyn ExceptionInfo> {
        self.inner.as_deref().map(|e| e as &dyn ExceptionInfo)
    }
}
