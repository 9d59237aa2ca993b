// Общие хелперы для интеграционных тестов монитора.
#![allow(dead_code)]

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use handlemon::{
    BacktraceMode, DiagnosticSink, FileOpener, HandleMonitor, LocalOpener, MonitorConfig,
    OpenContext, ReadSource,
};
use log::Level;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("hmtest-{prefix}-{pid}-{t}-{id}"))
}

pub fn write_file(root: &Path, name: &str, data: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(root)?;
    let p = root.join(name);
    fs::write(&p, data)?;
    Ok(p)
}

/// One emitted diagnostic line.
#[derive(Debug, Clone)]
pub struct Emitted {
    pub level: Level,
    pub message: String,
    pub stream_id: Option<u64>,
}

/// Sink that records everything it gets.
#[derive(Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<Emitted>>,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<Emitted> {
        std::mem::take(&mut *self.lines.lock().unwrap())
    }
}

impl DiagnosticSink for CollectingSink {
    fn emit(&self, level: Level, message: &str, context: Option<&OpenContext>) {
        self.lines.lock().unwrap().push(Emitted {
            level,
            message: message.to_string(),
            stream_id: context.map(|c| c.stream_id()),
        });
    }
}

pub fn quiet_config() -> MonitorConfig {
    MonitorConfig::default().with_backtrace(BacktraceMode::Off)
}

/// Monitor over real files with a collecting sink.
pub fn monitor_with_sink() -> (Arc<HandleMonitor>, Arc<CollectingSink>) {
    let sink = CollectingSink::new();
    let m = HandleMonitor::with_parts(quiet_config(), Box::new(LocalOpener), sink.clone());
    (m, sink)
}

/// Source whose close always fails (reads are served from memory).
pub struct FailingCloseSource {
    data: io::Cursor<Vec<u8>>,
    pub closes: Arc<AtomicU64>,
}

impl Read for FailingCloseSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.data.read(buf)
    }
}

impl ReadSource for FailingCloseSource {
    fn close(&mut self) -> io::Result<()> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        Err(io::Error::other("close failed"))
    }
}

/// Opener for synthetic sources: paths containing "missing" fail with NotFound,
/// "denied" with PermissionDenied; everything else opens a FailingCloseSource.
#[derive(Default)]
pub struct FailingCloseOpener {
    pub closes: Arc<AtomicU64>,
}

impl FileOpener for FailingCloseOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSource>> {
        let s = path.to_string_lossy();
        if s.contains("missing") {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
        }
        if s.contains("denied") {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        }
        Ok(Box::new(FailingCloseSource {
            data: io::Cursor::new(s.as_bytes().to_vec()),
            closes: self.closes.clone(),
        }))
    }
}
