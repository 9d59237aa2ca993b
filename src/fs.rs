//! LocalFileSystem — минимальная файловая система поверх каталога, с опциональным монитором.
//!
//! The monitor is injected (or created from MonitorConfig when `enabled`); when present,
//! every input stream is tracked and destructive operations on busy files are reported
//! with a detailed dump. With `block_busy_ops` they are refused instead.

use log::{error, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::error::{HandleError, HandleResult};
use crate::monitor::HandleMonitor;
use crate::opener::{FileOpener, LocalOpener};
use crate::source::ReadSource;

#[derive(Debug)]
pub struct LocalFileSystem {
    root: PathBuf,
    monitor: Option<Arc<HandleMonitor>>,
    block_busy_ops: bool,
}

impl LocalFileSystem {
    /// Filesystem rooted at `root`; a monitor is created only if `config.enabled`.
    pub fn new(root: impl Into<PathBuf>, config: MonitorConfig) -> Self {
        let block_busy_ops = config.block_busy_ops;
        let monitor = if config.enabled {
            Some(HandleMonitor::new(config))
        } else {
            None
        };
        Self {
            root: root.into(),
            monitor,
            block_busy_ops,
        }
    }

    /// Filesystem using an externally created monitor.
    pub fn with_monitor(root: impl Into<PathBuf>, monitor: Arc<HandleMonitor>) -> Self {
        let block_busy_ops = monitor.config().block_busy_ops;
        Self {
            root: root.into(),
            monitor: Some(monitor),
            block_busy_ops,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn monitor(&self) -> Option<&Arc<HandleMonitor>> {
        self.monitor.as_ref()
    }

    /// `rel` is joined to the root as-is (a leading '/' is dropped); no normalization.
    pub fn resolve(&self, rel: &str) -> PathBuf {
        self.root.join(rel.trim_start_matches('/'))
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.resolve(rel).exists()
    }

    /// True if the monitor tracks an open stream on `rel` (always false without a monitor).
    pub fn is_open(&self, rel: &str) -> bool {
        match &self.monitor {
            Some(m) => m.is_open(self.resolve(rel)),
            None => false,
        }
    }

    /// Open `rel` for reading; tracked when a monitor is present.
    pub fn get_input_stream(&self, rel: &str) -> HandleResult<Box<dyn ReadSource>> {
        let path = self.resolve(rel);
        match &self.monitor {
            Some(m) => Ok(Box::new(m.open(&path)?)),
            None => LocalOpener
                .open(&path)
                .map_err(|e| HandleError::from_io(&path, e)),
        }
    }

    /// Delete a file. Busy files are reported (and refused with `block_busy_ops`).
    pub fn delete_file(&self, rel: &str) -> HandleResult<()> {
        let path = self.resolve(rel);
        self.check_busy(&path, "delete")?;
        fs::remove_file(&path).map_err(|e| {
            self.report_failure(&path, "delete", &e);
            HandleError::from_io(&path, e)
        })
    }

    /// Rename/move a file. Same busy handling as delete_file, checked on the source.
    pub fn rename(&self, from: &str, to: &str) -> HandleResult<()> {
        let src = self.resolve(from);
        let dst = self.resolve(to);
        self.check_busy(&src, "rename")?;
        fs::rename(&src, &dst).map_err(|e| {
            self.report_failure(&src, "rename", &e);
            HandleError::from_io(&src, e)
        })
    }

    /// Dump all open handles (no-op without a monitor).
    pub fn dump(&self) {
        if let Some(m) = &self.monitor {
            m.dump();
        }
    }

    fn check_busy(&self, path: &Path, op: &str) -> HandleResult<()> {
        let Some(m) = &self.monitor else {
            return Ok(());
        };
        let count = m.open_count(path);
        if count == 0 {
            return Ok(());
        }
        warn!(
            "{op} {}: there are still {count} open stream(s)",
            path.display()
        );
        m.dump_path(path);
        if self.block_busy_ops {
            return Err(HandleError::StillOpen {
                path: path.to_path_buf(),
                count,
            });
        }
        Ok(())
    }

    fn report_failure(&self, path: &Path, op: &str, e: &std::io::Error) {
        if let Some(m) = &self.monitor {
            if m.is_open(path) {
                error!(
                    "unable to {op} {}: {e}; there are still open streams",
                    path.display()
                );
                m.dump_path(path);
            }
        }
    }
}
