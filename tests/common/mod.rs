#![allow(dead_code)]

use async_trait::async_trait;
use lumberjack::ambient::{AccessError, RequestAccessor, RequestView};
use lumberjack::record::Severity;
use lumberjack::sink::{LogSink, SinkError};
use lumberjack::template::TemplateFields;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Keeps every written entry in memory.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(Severity, TemplateFields)>>,
}

impl RecordingSink {
    pub fn entries(&self) -> Vec<(Severity, TemplateFields)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl LogSink for RecordingSink {
    async fn write(&self, severity: Severity, fields: &TemplateFields) -> Result<(), SinkError> {
        self.entries.lock().unwrap().push((severity, fields.clone()));
        Ok(())
    }
}

/// Fails every write with an I/O error.
#[derive(Default)]
pub struct FailingSink {
    pub attempts: AtomicUsize,
}

#[async_trait]
impl LogSink for FailingSink {
    async fn write(&self, _severity: Severity, _fields: &TemplateFields) -> Result<(), SinkError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk full",
        )))
    }
}

/// Request accessor that counts how often it is asked.
pub struct CountingRequest {
    pub view: Option<RequestView>,
    pub calls: AtomicUsize,
}

impl CountingRequest {
    pub fn new(view: Option<RequestView>) -> Self {
        Self {
            view,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RequestAccessor for CountingRequest {
    fn current(&self) -> Result<RequestView, AccessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.view.clone().ok_or(AccessError::NotAvailable)
    }
}
