use crate::ambient::{CorrelationAccessor, RequestAccessor};
use crate::backend::{make_channel_sinks, BackendBuildError};
use crate::builder::{Ambient, LogRecordBuilder};
use crate::config::{ConfigError, LoggerOptions};
use crate::exception::ExceptionInfo;
use crate::record::{Category, ContextMap, Identity, LogRecord};
use crate::router::{CategoryRouter, ChannelSinks, Routed};
use crate::sink::SinkError;
use crate::template::ServiceStamp;
use std::sync::Arc;

/// Error returned when a [`LumberJack`] cannot be constructed.
#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Backend(#[from] BackendBuildError),
}

/// Name of the local machine, or an empty string if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_else(|e| {
            tracing::debug!(error = %e, "could not read hostname");
            String::new()
        })
}

/// Request-scoped structured logger.
///
/// Every call resolves the ambient request, builds one record and writes
/// it to the channel of its category before returning. No state is shared
/// between calls beyond the read-only configuration and sink handles, so a
/// single instance (typically behind an `Arc`) serves all requests.
#[derive(Clone)]
pub struct LumberJack {
    options: LoggerOptions,
    request: Arc<dyn RequestAccessor>,
    correlation: Arc<dyn CorrelationAccessor>,
    router: CategoryRouter,
}

impl LumberJack {
    /// Validate `options`, build the channel sinks they describe and
    /// create the logger. Fails before any log call is possible if the
    /// configuration is unusable.
    pub fn from_options(
        options: LoggerOptions,
        request: Arc<dyn RequestAccessor>,
        correlation: Arc<dyn CorrelationAccessor>,
    ) -> Result<Self, SetupError> {
        options.validate()?;
        let sinks = make_channel_sinks(&options)?;
        Ok(Self::with_sinks(options, request, correlation, sinks))
    }

    /// Create a logger over explicit sink handles.
    pub fn with_sinks(
        options: LoggerOptions,
        request: Arc<dyn RequestAccessor>,
        correlation: Arc<dyn CorrelationAccessor>,
        sinks: ChannelSinks,
    ) -> Self {
        let stamp = ServiceStamp {
            product: options.product.clone(),
            hostname: local_hostname(),
            environment_name: options.environment_name.clone(),
        };
        let router = CategoryRouter::new(sinks, stamp, options.enable_diagnostics);
        Self {
            options,
            request,
            correlation,
            router,
        }
    }

    pub fn options(&self) -> &LoggerOptions {
        &self.options
    }

    pub fn router(&self) -> &CategoryRouter {
        &self.router
    }

    fn ambient(&self) -> Ambient {
        Ambient::capture(
            self.request.as_ref(),
            self.correlation.as_ref(),
            self.options.add_claims,
            self.options.add_session,
        )
    }

    /// Context, identity and location of the current request.
    pub fn logging_data(&self) -> (ContextMap, Identity, String) {
        self.ambient().logging_data()
    }

    /// Record that a user did something. Caller keys are stored as
    /// `Info-{key}`.
    pub async fn log_usage(
        &self,
        message: &str,
        additional_info: Option<&ContextMap>,
    ) -> Result<Routed, SinkError> {
        let mut builder = LogRecordBuilder::new(Category::Usage).message(message);
        if let Some(info) = additional_info {
            builder = builder.caller_context(info);
        }
        self.write(&builder.build(&self.ambient())).await
    }

    /// Record how long an operation took.
    pub async fn log_performance(
        &self,
        elapsed_millis: i64,
        performance_info: Option<&ContextMap>,
    ) -> Result<Routed, SinkError> {
        let mut builder = LogRecordBuilder::new(Category::Performance).elapsed_millis(elapsed_millis);
        if let Some(info) = performance_info {
            builder = builder.caller_context(info);
        }
        self.write(&builder.build(&self.ambient())).await
    }

    /// Record diagnostic detail. Does nothing, not even request
    /// resolution, unless diagnostics are enabled.
    pub async fn log_diagnostic(
        &self,
        message: &str,
        diagnostic_info: Option<&ContextMap>,
    ) -> Result<Routed, SinkError> {
        if !self.router.admits(Category::Diagnostic) {
            return Ok(Routed::Suppressed);
        }
        let mut builder = LogRecordBuilder::new(Category::Diagnostic).message(message);
        if let Some(info) = diagnostic_info {
            builder = builder.caller_context(info);
        }
        self.write(&builder.build(&self.ambient())).await
    }

    /// Record a failure. The message of the deepest inner exception
    /// replaces `message`, and a `Procedure` data entry replaces the
    /// request location.
    pub async fn log_error(
        &self,
        exception: &dyn ExceptionInfo,
        message: Option<&str>,
    ) -> Result<Routed, SinkError> {
        let mut builder = LogRecordBuilder::new(Category::Error).exception(exception);
        if let Some(message) = message {
            builder = builder.message(message);
        }
        self.write(&builder.build(&self.ambient())).await
    }

    /// Route an already built record by its category.
    pub async fn write(&self, record: &LogRecord) -> Result<Routed, SinkError> {
        self.router.route(record).await
    }
}
