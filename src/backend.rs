use std::sync::Arc;

use crate::config::LoggerOptions;
use crate::file_sink::FileSink;
use crate::router::ChannelSinks;
use crate::sink::LogSink;

/// Supported backend kinds, selected from [`LoggerOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// One JSON-lines file per channel under `LogLocation`.
    File,
    /// HTTP event collector at `EventCollector`.
    EventCollector,
}

/// Pick the backend the options ask for: the event collector when an
/// address is configured, local files otherwise.
pub fn select_backend(options: &LoggerOptions) -> BackendKind {
    match options.event_collector.as_deref() {
        Some(address) if !address.trim().is_empty() => BackendKind::EventCollector,
        _ => BackendKind::File,
    }
}

/// Error type returned when building channel sinks from configuration.
#[derive(thiserror::Error, Debug)]
pub enum BackendBuildError {
    #[error("collector feature is not enabled")]
    CollectorFeatureDisabled,

    #[error("missing setting for {0:?} backend: {1}")]
    MissingSetting(BackendKind, &'static str),
}

/// Create the four channel sinks described by `options`.
///
/// This is the main entry point for services that want the standard
/// layout instead of constructing sinks manually.
pub fn make_channel_sinks(options: &LoggerOptions) -> Result<ChannelSinks, BackendBuildError> {
    let kind = select_backend(options);
    tracing::debug!(backend = ?kind, "building channel sinks");

    match kind {
        BackendKind::File => Ok(ChannelSinks::from_fn(|channel| {
            let path = options.log_location.join(channel.file_name());
            Arc::new(FileSink::new(path)) as Arc<dyn LogSink>
        })),
        BackendKind::EventCollector => {
            #[cfg(feature = "collector")]
            {
                use crate::collector::{EventCollectorConfig, EventCollectorSink};

                let url = options
                    .event_collector
                    .clone()
                    .ok_or(BackendBuildError::MissingSetting(kind, "EventCollector"))?;
                let token = options
                    .event_collector_token
                    .clone()
                    .filter(|t| !t.is_empty())
                    .ok_or(BackendBuildError::MissingSetting(kind, "EventCollectorToken"))?;
                let hostname = crate::lumberjack::local_hostname();

                Ok(ChannelSinks::from_fn(|channel| {
                    let config = EventCollectorConfig {
                        url: url.clone(),
                        token: token.clone(),
                        source: channel.source_name().to_string(),
                        hostname: hostname.clone(),
                    };
                    Arc::new(EventCollectorSink::new(config)) as Arc<dyn LogSink>
                }))
            }

            #[cfg(not(feature = "collector"))]
            {
                Err(BackendBuildError::CollectorFeatureDisabled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn options() -> LoggerOptions {
        LoggerOptions {
            log_location: PathBuf::from("logs"),
            ..Default::default()
        }
    }

    #[test]
    fn selects_file_backend_without_collector() {
        assert_eq!(select_backend(&options()), BackendKind::File);
        let blank = LoggerOptions {
            event_collector: Some("  ".to_string()),
            ..options()
        };
        assert_eq!(select_backend(&blank), BackendKind::File);
    }

    #[test]
    fn selects_collector_when_address_set() {
        let opts = LoggerOptions {
            event_collector: Some("https://collector:8088".to_string()),
            event_collector_token: Some("t".to_string()),
            ..options()
        };
        assert_eq!(select_backend(&opts), BackendKind::EventCollector);
    }

    #[test]
    fn file_backend_builds() {
        assert!(make_channel_sinks(&options()).is_ok());
    }

    #[cfg(feature = "collector")]
    #[test]
    fn collector_backend_requires_token() {
        let opts = LoggerOptions {
            event_collector: Some("https://collector:8088".to_string()),
            ..options()
        };
        assert!(matches!(
            make_channel_sinks(&opts),
            Err(BackendBuildError::MissingSetting(BackendKind::EventCollector, "EventCollectorToken"))
        ));
    }
}
