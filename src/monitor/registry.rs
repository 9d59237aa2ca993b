//! monitor/registry — реестр открытых хэндлов: путь -> HandleGroup.
//!
//! Назначение:
//! - Один HandleMonitor создаётся файловой системой-хозяином и живёт столько же, сколько она.
//! - Группа создаётся лениво при первом open() пути и удаляется в момент, когда её последний
//!   поток закрыт (см. HandleGroup::notify_closed -> remove_group).
//!
//! Notes:
//! - Paths are used verbatim: "/a" and "/a/../a" are different identities.
//! - open() registers under the registry lock, so a concurrent "last close" of the same path
//!   either happens before (and removes the old group) or after (and sees the new member).
//! - Dumps are emitted from a snapshot taken under the lock; the sink runs unlocked.

use log::{debug, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::group::HandleGroup;
use super::report::{FileReport, MonitorReport};
use super::stream::TrackedStream;
use crate::config::MonitorConfig;
use crate::diag::{DiagnosticSink, LogSink, OpenContext};
use crate::error::{HandleError, HandleResult};
use crate::metrics::{MetricsSnapshot, MonitorMetrics};
use crate::opener::{FileOpener, LocalOpener};

pub(crate) type GroupMap = HashMap<PathBuf, Arc<HandleGroup>>;

/// Registry of open read handles, keyed by path.
pub struct HandleMonitor {
    groups: Mutex<GroupMap>,
    opener: Box<dyn FileOpener>,
    sink: Arc<dyn DiagnosticSink>,
    config: MonitorConfig,
    next_stream_id: AtomicU64,
    pub(super) counters: MonitorMetrics,
}

impl HandleMonitor {
    /// Monitor over the local filesystem, dumping through the `log` facade.
    pub fn new(config: MonitorConfig) -> Arc<Self> {
        Self::with_parts(config, Box::new(LocalOpener), Arc::new(LogSink))
    }

    /// Monitor with an explicit opener and diagnostic sink.
    pub fn with_parts(
        config: MonitorConfig,
        opener: Box<dyn FileOpener>,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            groups: Mutex::new(HashMap::new()),
            opener,
            sink,
            config,
            next_stream_id: AtomicU64::new(1),
            counters: MonitorMetrics::default(),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub(super) fn lock_groups(&self) -> MutexGuard<'_, GroupMap> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open `path` for reading and track the returned stream.
    ///
    /// On failure nothing is registered.
    pub fn open(self: &Arc<Self>, path: impl AsRef<Path>) -> HandleResult<TrackedStream> {
        let path = path.as_ref();
        let source = match self.opener.open(path) {
            Ok(s) => s,
            Err(e) => {
                self.counters.record_open_failure();
                debug!("open {}: {}", path.display(), e);
                return Err(HandleError::from_io(path, e));
            }
        };

        // Стек снимаем до захвата лока: Backtrace::force_capture может быть дорогим
        let id = self.next_stream_id.fetch_add(1, Ordering::Relaxed);
        let ctx = Arc::new(OpenContext::capture(id, path, self.config.backtrace));

        let mut map = self.lock_groups();
        let group = map.entry(path.to_path_buf()).or_insert_with(|| {
            self.counters.record_group_created();
            debug!("handle group created: {}", path.display());
            Arc::new(HandleGroup::new(
                path.to_path_buf(),
                Arc::downgrade(self),
                Arc::clone(&self.sink),
                self.config.dump_level,
            ))
        });
        let stream = group.open(source, ctx);
        drop(map);

        self.counters.record_open();
        debug!("stream {} opened: {}", id, path.display());
        Ok(stream)
    }

    /// True iff at least one stream opened against `path` is still open.
    pub fn is_open(&self, path: impl AsRef<Path>) -> bool {
        let map = self.lock_groups();
        match map.get(path.as_ref()) {
            Some(g) => {
                debug_assert!(!g.is_empty(), "registered group must be non-empty");
                true
            }
            None => false,
        }
    }

    /// Number of open streams for `path` (0 if untracked).
    pub fn open_count(&self, path: impl AsRef<Path>) -> usize {
        self.lock_groups()
            .get(path.as_ref())
            .map(|g| g.len())
            .unwrap_or(0)
    }

    /// The live group for `path`, if any. Crate-only: outside callers must not
    /// extend a group's life past its removal from the registry.
    pub(crate) fn group(&self, path: impl AsRef<Path>) -> Option<Arc<HandleGroup>> {
        self.lock_groups().get(path.as_ref()).cloned()
    }

    /// Currently tracked paths, sorted.
    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        let mut v: Vec<PathBuf> = self.lock_groups().keys().cloned().collect();
        v.sort();
        v
    }

    /// Consistent snapshot of all groups. `detailed` includes per-stream openers.
    pub fn report(&self, detailed: bool) -> MonitorReport {
        let files: Vec<FileReport> = {
            let map = self.lock_groups();
            map.values().map(|g| g.summary(detailed)).collect()
        };
        MonitorReport::new(files)
    }

    /// Emit path and open-stream count for every tracked file.
    pub fn dump(&self) {
        self.report(false).emit(&*self.sink, self.config.dump_level);
    }

    /// Emit detailed diagnostics (who opened what) for one path; no-op if not open.
    pub fn dump_path(&self, path: impl AsRef<Path>) {
        // group() отпускает лок реестра до вывода
        if let Some(group) = self.group(path) {
            group.dump(true);
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.counters.snapshot()
    }

    /// Drop the entry for an emptied group. Called only from HandleGroup::notify_closed,
    /// with the registry lock already held.
    pub(super) fn remove_group(&self, map: &mut GroupMap, group: &HandleGroup) {
        let registered = map
            .get(group.path())
            .is_some_and(|g| std::ptr::eq(Arc::as_ptr(g), group));
        if !registered {
            warn!(
                "remove_group: {} is not the registered group, skip",
                group.path().display()
            );
            return;
        }
        map.remove(group.path());
        self.counters.record_group_removed();
        debug!("handle group removed: {}", group.path().display());
    }
}

impl std::fmt::Debug for HandleMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleMonitor")
            .field("config", &self.config)
            .field("tracked", &self.lock_groups().len())
            .finish()
    }
}
