use crate::ambient::{AccessError, CorrelationAccessor, RequestAccessor, RequestView};
use crate::context::{self, ContextSource};
use crate::exception::{self, ExceptionInfo};
use crate::flatten::flatten;
use crate::record::{Category, ContextMap, Identity, LogRecord};
use chrono::Utc;

/// Message of an error record when neither the caller nor the exception
/// provides one.
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred during processing.";

/// Ambient state captured once per log call.
#[derive(Debug, Clone, Default)]
pub struct Ambient {
    pub request: Option<RequestView>,
    pub correlation_id: Option<String>,
    /// Copy identity claims into the context.
    pub add_claims: bool,
    /// Copy session keys into the context.
    pub add_session: bool,
}

impl Ambient {
    /// Snapshot the current request and correlation id. A missing request
    /// is not an error; the record then carries default identity and an
    /// empty location.
    pub fn capture(
        request: &dyn RequestAccessor,
        correlation: &dyn CorrelationAccessor,
        add_claims: bool,
        add_session: bool,
    ) -> Self {
        let request = match request.current() {
            Ok(view) => Some(view),
            Err(AccessError::NotAvailable) => {
                tracing::debug!("no active request, using default identity and location");
                None
            }
        };
        Ambient {
            request,
            correlation_id: correlation.correlation_id().filter(|id| !id.is_empty()),
            add_claims,
            add_session,
        }
    }

    /// Context, identity and location derived from the ambient request.
    pub fn logging_data(&self) -> (ContextMap, Identity, String) {
        let request = match &self.request {
            Some(request) => request,
            None => return (ContextMap::new(), Identity::default(), String::new()),
        };
        let context = context::merge(&self.sources(request));
        (
            context,
            context::resolve_identity(&request.claims),
            context::resolve_location(request),
        )
    }

    fn sources<'a>(&self, request: &'a RequestView) -> Vec<ContextSource<'a>> {
        let mut sources = vec![ContextSource::Request(request)];
        if self.add_claims {
            sources.push(ContextSource::Claims(&request.claims));
        }
        if self.add_session {
            if let Some(session) = &request.session {
                sources.push(ContextSource::Session(session));
            }
        }
        sources
    }
}

/// Assembles a [`LogRecord`] from a log call and the ambient state.
///
/// ```
/// use lumberjack::builder::{Ambient, LogRecordBuilder};
/// use lumberjack::record::Category;
///
/// let record = LogRecordBuilder::new(Category::Performance)
///     .elapsed_millis(120)
///     .build(&Ambient::default());
/// assert_eq!(record.elapsed_millis(), Some(120));
/// assert!(record.exception_trace().is_none());
/// ```
pub struct LogRecordBuilder<'a> {
    category: Category,
    message: Option<String>,
    exception: Option<&'a dyn ExceptionInfo>,
    elapsed_millis: Option<i64>,
    caller_context: Option<&'a ContextMap>,
}

impl<'a> LogRecordBuilder<'a> {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            message: None,
            exception: None,
            elapsed_millis: None,
            caller_context: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn exception(mut self, exception: &'a dyn ExceptionInfo) -> Self {
        self.exception = Some(exception);
        self
    }

    /// Ignored for every category but [`Category::Performance`].
    pub fn elapsed_millis(mut self, elapsed_millis: i64) -> Self {
        self.elapsed_millis = Some(elapsed_millis);
        self
    }

    pub fn caller_context(mut self, context: &'a ContextMap) -> Self {
        self.caller_context = Some(context);
        self
    }

    pub fn build(self, ambient: &Ambient) -> LogRecord {
        let (mut context, identity, mut location) = ambient.logging_data();

        if let Some(entries) = self.caller_context {
            context::merge_into(
                &mut context,
                ContextSource::Caller {
                    entries,
                    prefix: self.category.caller_key_prefix(),
                },
            );
        }

        let mut message = self.message.unwrap_or_default();
        let mut exception_type = None;
        let mut exception_trace = None;

        if let Some(exception) = self.exception {
            let root_message = exception::deepest_message(exception);
            if !root_message.is_empty() {
                message = root_message.to_string();
            }
            if let Some(procedure) = exception::find_procedure(exception) {
                location = procedure;
            }
            context::merge_into(&mut context, ContextSource::ExceptionData(exception.data()));
            exception_type = Some(exception.type_name().to_string());
            exception_trace = Some(flatten(exception, ""));
        }

        if message.is_empty() && self.category == Category::Error {
            message = DEFAULT_ERROR_MESSAGE.to_string();
        }

        let elapsed_millis = match self.category {
            Category::Performance => self.elapsed_millis,
            _ => None,
        };

        LogRecord {
            timestamp: Utc::now(),
            category: self.category,
            message,
            location,
            correlation_id: ambient.correlation_id.clone(),
            elapsed_millis,
            exception_type,
            exception_trace,
            context,
            identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ambient::{Claim, FixedCorrelation, FixedRequest, NoRequest, SessionView};
    use crate::context::PART_ID_CLAIM;
    use crate::exception::LoggedError;
    use serde_json::json;

    fn request() -> RequestView {
        RequestView {
            claims: vec![
                Claim::new(PART_ID_CLAIM, "77"),
                Claim::new("givenname", "ada"),
                Claim::new("surname", "lovelace"),
            ],
            method: "POST".to_string(),
            route_template: Some("api/orders".to_string()),
            route_values: vec![("controller".to_string(), "Orders".to_string())],
            query_string: "dryRun=true".to_string(),
            referrer: None,
            user_agent: Some("test-agent".to_string()),
            session: Some(SessionView {
                id: "sess-9".to_string(),
                keys: vec!["basket".to_string()],
            }),
        }
    }

    fn ambient() -> Ambient {
        Ambient {
            request: Some(request()),
            correlation_id: Some("corr-1".to_string()),
            add_claims: false,
            add_session: false,
        }
    }

    #[test]
    fn every_record_carries_who_and_where() {
        let record = LogRecordBuilder::new(Category::Usage)
            .message("viewed orders")
            .build(&ambient());
        assert_eq!(record.identity().part_id, 77);
        assert_eq!(record.identity().user_name, "ADA.LOVELACE");
        assert_eq!(record.location(), "POST api/orders");
        assert_eq!(record.correlation_id(), Some("corr-1"));
        assert_eq!(record.context()["Route-controller"], json!("Orders"));
        assert_eq!(record.context()["queryString-0-dryRun"], json!("true"));
        assert!(record.exception_trace().is_none());
    }

    #[test]
    fn usage_prefixes_caller_keys_and_performance_does_not() {
        let mut info = ContextMap::new();
        info.insert("orderId".to_string(), json!(5));

        let usage = LogRecordBuilder::new(Category::Usage)
            .caller_context(&info)
            .build(&ambient());
        assert_eq!(usage.context()["Info-orderId"], json!(5));

        let perf = LogRecordBuilder::new(Category::Performance)
            .caller_context(&info)
            .elapsed_millis(250)
            .build(&ambient());
        assert_eq!(perf.context()["orderId"], json!(5));
        assert_eq!(perf.elapsed_millis(), Some(250));
        assert!(perf.exception_trace().is_none());
    }

    #[test]
    fn elapsed_is_ignored_outside_performance() {
        let record = LogRecordBuilder::new(Category::Diagnostic)
            .elapsed_millis(10)
            .build(&ambient());
        assert_eq!(record.elapsed_millis(), None);
    }

    #[test]
    fn exception_overrides_message_location_and_context() {
        let err = LoggedError::new("DbError", "outer failure")
            .with_data("Table", "Orders")
            .with_inner(
                LoggedError::new("SqlError", "deadlock")
                    .with_data("Procedure", "Foo.Bar")
                    .with_data("Inner-only", "x"),
            );

        let record = LogRecordBuilder::new(Category::Error)
            .message("caller message")
            .exception(&err)
            .build(&ambient());

        assert_eq!(record.message(), "deadlock");
        assert_eq!(record.location(), "Foo.Bar");
        assert_eq!(record.exception_type(), Some("DbError"));
        assert_eq!(record.context()["Table"], json!("Orders"));
        assert!(!record.context().contains_key("Inner-only"));
        assert!(!record.exception_trace().unwrap().is_empty());
    }

    #[test]
    fn location_falls_back_without_procedure() {
        let err = LoggedError::new("E", "m");
        let record = LogRecordBuilder::new(Category::Error)
            .exception(&err)
            .build(&ambient());
        assert_eq!(record.location(), "POST api/orders");
    }

    #[test]
    fn error_without_message_gets_default() {
        let record = LogRecordBuilder::new(Category::Error).build(&ambient());
        assert_eq!(record.message(), DEFAULT_ERROR_MESSAGE);

        let silent = LoggedError::new("E", "");
        let record = LogRecordBuilder::new(Category::Error)
            .exception(&silent)
            .build(&ambient());
        assert_eq!(record.message(), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn claims_and_session_follow_options() {
        let with_all = Ambient {
            add_claims: true,
            add_session: true,
            ..ambient()
        };
        let record = LogRecordBuilder::new(Category::Usage).build(&with_all);
        assert_eq!(record.context()["UserClaim-1-bits_participant_partid"], json!("77"));
        assert_eq!(record.context()["UserClaim-3-surname"], json!("lovelace"));
        assert_eq!(record.context()["SessionId"], json!("sess-9"));

        let record = LogRecordBuilder::new(Category::Usage).build(&ambient());
        assert!(record.context().keys().all(|k| !k.starts_with("UserClaim-")));
        assert!(!record.context().contains_key("SessionId"));
    }

    #[test]
    fn missing_request_degrades_to_defaults() {
        let ambient = Ambient::capture(&NoRequest, &FixedCorrelation(None), true, true);
        let record = LogRecordBuilder::new(Category::Usage).message("x").build(&ambient);
        assert_eq!(record.identity(), &Identity::default());
        assert_eq!(record.location(), "");
        assert!(record.context().is_empty());
        assert_eq!(record.correlation_id(), None);
    }

    #[test]
    fn capture_reads_accessors() {
        let ambient = Ambient::capture(
            &FixedRequest(request()),
            &FixedCorrelation(Some("abc".to_string())),
            false,
            false,
        );
        assert_eq!(ambient.request.as_ref().map(|r| r.method.as_str()), Some("POST"));
        assert_eq!(ambient.correlation_id.as_deref(), Some("abc"));
    }
}
