//! Serializable snapshot of the monitor state.

use log::Level;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::diag::{DiagnosticSink, OpenContext};

#[derive(Debug, Clone, Serialize)]
pub struct OpenerReport {
    pub stream_id: u64,
    pub thread: String,
    pub opened_at_nanos: u128,
    pub backtrace: Option<String>,
}

/// One tracked path.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub path: String,
    pub streams: usize,
    /// Filled only for detailed reports.
    pub openers: Vec<OpenerReport>,
    #[serde(skip)]
    contexts: Vec<Arc<OpenContext>>,
}

impl FileReport {
    pub(crate) fn new(path: &Path, streams: usize, contexts: Vec<Arc<OpenContext>>) -> Self {
        let openers = contexts
            .iter()
            .map(|c| OpenerReport {
                stream_id: c.stream_id(),
                thread: c.thread().to_string(),
                opened_at_nanos: c.opened_at_nanos(),
                backtrace: c.backtrace_text(),
            })
            .collect();
        Self {
            path: path.display().to_string(),
            streams,
            openers,
            contexts,
        }
    }

    pub fn emit(&self, sink: &dyn DiagnosticSink, level: Level) {
        sink.emit(level, &format!("- {}, {}", self.path, self.streams), None);
        for ctx in &self.contexts {
            sink.emit(level, &ctx.describe(), Some(ctx.as_ref()));
        }
    }
}

/// All tracked paths at one instant, sorted by path.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorReport {
    pub open_files: usize,
    pub open_streams: usize,
    pub files: Vec<FileReport>,
}

impl MonitorReport {
    pub(crate) fn new(mut files: Vec<FileReport>) -> Self {
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Self {
            open_files: files.len(),
            open_streams: files.iter().map(|f| f.streams).sum(),
            files,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn file(&self, path: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn emit(&self, sink: &dyn DiagnosticSink, level: Level) {
        sink.emit(level, &format!("Number of open files: {}", self.open_files), None);
        for f in &self.files {
            f.emit(sink, level);
        }
    }
}
