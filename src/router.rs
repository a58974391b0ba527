use crate::record::{Category, LogRecord};
use crate::sink::{LogSink, SinkError};
use crate::template::{ServiceStamp, TemplateFields};
use std::fmt;
use std::sync::Arc;

/// Logical output channel. Each one is backed by its own sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Usage,
    Performance,
    Error,
    Diagnostic,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Usage,
        Channel::Performance,
        Channel::Error,
        Channel::Diagnostic,
    ];

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Usage => Channel::Usage,
            Category::Performance => Channel::Performance,
            Category::Error => Channel::Error,
            Category::Diagnostic => Channel::Diagnostic,
        }
    }

    /// File name used by the file backend.
    pub fn file_name(&self) -> &'static str {
        match self {
            Channel::Usage => "usage.json",
            Channel::Performance => "perf.json",
            Channel::Error => "error.json",
            Channel::Diagnostic => "diag.json",
        }
    }

    /// Short name used to tag events sent to a shared collector.
    pub fn source_name(&self) -> &'static str {
        match self {
            Channel::Usage => "usage",
            Channel::Performance => "perf",
            Channel::Error => "error",
            Channel::Diagnostic => "diag",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.source_name())
    }
}

/// One sink handle per channel.
#[derive(Clone)]
pub struct ChannelSinks {
    pub usage: Arc<dyn LogSink>,
    pub performance: Arc<dyn LogSink>,
    pub error: Arc<dyn LogSink>,
    pub diagnostic: Arc<dyn LogSink>,
}

impl ChannelSinks {
    /// Build all four sinks with a per-channel constructor.
    pub fn from_fn(mut make: impl FnMut(Channel) -> Arc<dyn LogSink>) -> Self {
        ChannelSinks {
            usage: make(Channel::Usage),
            performance: make(Channel::Performance),
            error: make(Channel::Error),
            diagnostic: make(Channel::Diagnostic),
        }
    }

    /// Same sink behind every channel.
    pub fn shared(sink: Arc<dyn LogSink>) -> Self {
        Self::from_fn(|_| Arc::clone(&sink))
    }

    pub fn get(&self, channel: Channel) -> &Arc<dyn LogSink> {
        match channel {
            Channel::Usage => &self.usage,
            Channel::Performance => &self.performance,
            Channel::Error => &self.error,
            Channel::Diagnostic => &self.diagnostic,
        }
    }
}

/// Outcome of routing one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Written(Channel),
    /// Diagnostic record dropped because diagnostics are disabled.
    Suppressed,
}

/// Sends built records to the sink of their category's channel.
///
/// Holds no per-call state, so one router serves concurrent callers.
#[derive(Clone)]
pub struct CategoryRouter {
    sinks: ChannelSinks,
    stamp: ServiceStamp,
    diagnostics_enabled: bool,
}

impl CategoryRouter {
    pub fn new(sinks: ChannelSinks, stamp: ServiceStamp, diagnostics_enabled: bool) -> Self {
        Self {
            sinks,
            stamp,
            diagnostics_enabled,
        }
    }

    pub fn diagnostics_enabled(&self) -> bool {
        self.diagnostics_enabled
    }

    /// Whether records of `category` reach a sink at all. Callers check
    /// this before building so a gated record costs nothing.
    pub fn admits(&self, category: Category) -> bool {
        category != Category::Diagnostic || self.diagnostics_enabled
    }

    pub fn stamp(&self) -> &ServiceStamp {
        &self.stamp
    }

    /// Write `record` to its channel, at most once.
    ///
    /// A failing sink only fails this call; other channels and later calls
    /// are unaffected.
    pub async fn route(&self, record: &LogRecord) -> Result<Routed, SinkError> {
        let category = record.category();
        if !self.admits(category) {
            tracing::debug!("diagnostics disabled, dropping diagnostic record");
            return Ok(Routed::Suppressed);
        }

        let channel = Channel::for_category(category);
        let fields = TemplateFields::from_record(record, &self.stamp);
        match self.sinks.get(channel).write(category.severity(), &fields).await {
            Ok(()) => Ok(Routed::Written(channel)),
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "failed to write log entry");
                Err(e)
            }
        }
    }
}
