//! Diagnostic plumbing: creation-context snapshots and the output sink.
//!
//! OpenContext is captured once, when a stream is opened, and is only ever
//! read back by dumps. Nothing in the open/close path depends on it.

use log::{log, Level};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::BacktraceMode;

/// Snapshot of "who opened this stream".
#[derive(Debug)]
pub struct OpenContext {
    stream_id: u64,
    path: PathBuf,
    thread: String,
    opened_at_nanos: u128,
    backtrace: Backtrace,
}

impl OpenContext {
    pub(crate) fn capture(stream_id: u64, path: &Path, mode: BacktraceMode) -> Self {
        let cur = std::thread::current();
        let thread = match cur.name() {
            Some(n) => n.to_string(),
            None => format!("{:?}", cur.id()),
        };
        let opened_at_nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let backtrace = match mode {
            BacktraceMode::Off => Backtrace::disabled(),
            BacktraceMode::Env => Backtrace::capture(),
            BacktraceMode::Always => Backtrace::force_capture(),
        };
        Self {
            stream_id,
            path: path.to_path_buf(),
            thread,
            opened_at_nanos,
            backtrace,
        }
    }

    pub fn stream_id(&self) -> u64 {
        self.stream_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name (or id) of the opening thread.
    pub fn thread(&self) -> &str {
        &self.thread
    }

    pub fn opened_at_nanos(&self) -> u128 {
        self.opened_at_nanos
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Rendered backtrace, only if one was actually captured.
    pub fn backtrace_text(&self) -> Option<String> {
        match self.backtrace.status() {
            BacktraceStatus::Captured => Some(self.backtrace.to_string()),
            _ => None,
        }
    }

    /// One-line summary used by dumps.
    pub fn describe(&self) -> String {
        format!(
            "- opened by: thread={}, stream={}, at={}",
            self.thread, self.stream_id, self.opened_at_nanos
        )
    }
}

/// Destination for dump output: leveled text plus optional structured context.
pub trait DiagnosticSink: Send + Sync {
    fn emit(&self, level: Level, message: &str, context: Option<&OpenContext>);
}

/// Forwards diagnostics to the `log` facade (target "handlemon").
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: Level, message: &str, context: Option<&OpenContext>) {
        match context.and_then(OpenContext::backtrace_text) {
            Some(bt) => log!(target: "handlemon", level, "{message}\n{bt}"),
            None => log!(target: "handlemon", level, "{message}"),
        }
    }
}
