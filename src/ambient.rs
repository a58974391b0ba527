/// A single identity claim (`type`, `value`) as issued by the host's
/// authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Session attached to the current request, if the host keeps one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionView {
    pub id: String,
    pub keys: Vec<String>,
}

/// Read-only snapshot of the request being served.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestView {
    /// Claims of the primary identity.
    pub claims: Vec<Claim>,
    pub method: String,
    /// Template of the matched route, `None` when nothing matched.
    pub route_template: Option<String>,
    /// Route values in the order the router produced them.
    pub route_values: Vec<(String, String)>,
    /// Raw query string, with or without the leading `?`.
    pub query_string: String,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub session: Option<SessionView>,
}

/// Error returned by ambient accessors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("no request is active")]
    NotAvailable,
}

/// Supplies the request currently being served.
pub trait RequestAccessor: Send + Sync {
    fn current(&self) -> Result<RequestView, AccessError>;
}

/// Supplies the correlation identifier of the current logical operation.
pub trait CorrelationAccessor: Send + Sync {
    fn correlation_id(&self) -> Option<String>;
}

/// Accessor for code running outside any request (workers, startup).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRequest;

impl RequestAccessor for NoRequest {
    fn current(&self) -> Result<RequestView, AccessError> {
        Err(AccessError::NotAvailable)
    }
}

/// Accessor over a snapshot captured by host middleware for one request.
#[derive(Debug, Clone, Default)]
pub struct FixedRequest(pub RequestView);

impl RequestAccessor for FixedRequest {
    fn current(&self) -> Result<RequestView, AccessError> {
        Ok(self.0.clone())
    }
}

/// Fixed correlation id, or none.
#[derive(Debug, Clone, Default)]
pub struct FixedCorrelation(pub Option<String>);

impl CorrelationAccessor for FixedCorrelation {
    fn correlation_id(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Uses the id of the current `tracing` span as correlation id.
///
/// Yields `None` outside any span or when no subscriber is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanCorrelation;

impl CorrelationAccessor for SpanCorrelation {
    fn correlation_id(&self) -> Option<String> {
        tracing::Span::current()
            .id()
            .map(|id| format!("{:016x}", id.into_u64()))
    }
}
