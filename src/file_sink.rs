use crate::record::Severity;
use crate::sink::{LogSink, SinkError};
use crate::template::{TemplateFields, MESSAGE_TEMPLATE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tokio::sync::Mutex;

/// Appends one JSON object per line to a file.
///
/// The file is opened lazily in append mode on the first write, so other
/// processes may append to the same file. Writes from this process are
/// serialized by an async mutex.
///
/// If the file does not end in a line break when it is (re)opened, for
/// instance after a write failed part way, the next entry starts on a
/// fresh line so only the damaged line is lost.
pub struct FileSink {
    path: PathBuf,
    file: Mutex<Option<OpenFile>>,
}

struct OpenFile {
    file: File,
    needs_newline: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct FileEntry<'a> {
    timestamp: &'a DateTime<Utc>,
    level: Severity,
    message_template: &'static str,
    properties: &'a TemplateFields,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn open(&self) -> Result<OpenFile, SinkError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let needs_newline = ends_mid_line(&self.path).await?;
        tracing::debug!(path = %self.path.display(), needs_newline, "opened log file");
        Ok(OpenFile { file, needs_newline })
    }
}

async fn ends_mid_line(path: &Path) -> std::io::Result<bool> {
    let mut file = File::open(path).await?;
    if file.metadata().await?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1)).await?;
    Ok(file.read_u8().await? != b'\n')
}

#[async_trait]
impl LogSink for FileSink {
    async fn write(&self, severity: Severity, fields: &TemplateFields) -> Result<(), SinkError> {
        let entry = FileEntry {
            timestamp: &fields.timestamp,
            level: severity,
            message_template: MESSAGE_TEMPLATE,
            properties: fields,
        };
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut guard = self.file.lock().await;
        if guard.is_none() {
            *guard = Some(self.open().await?);
        }
        let written = match guard.as_mut() {
            Some(open) => {
                if open.needs_newline {
                    line.insert(0, '\n');
                }
                match open.file.write_all(line.as_bytes()).await {
                    Ok(()) => {
                        open.needs_newline = false;
                        open.file.flush().await
                    }
                    Err(e) => Err(e),
                }
            }
            None => Ok(()),
        };
        if let Err(e) = written {
            // Reopen on the next write; reopening rechecks for a torn line.
            *guard = None;
            return Err(e.into());
        }
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        if let Some(open) = self.file.lock().await.as_mut() {
            open.file.flush().await?;
        }
        Ok(())
    }
}
