//! monitor/group — все открытые потоки одного пути.

use log::{debug, Level};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::registry::HandleMonitor;
use super::report::FileReport;
use super::stream::TrackedStream;
use crate::diag::{DiagnosticSink, OpenContext};
use crate::source::ReadSource;

/// Open streams of one file, keyed by stream id.
///
/// A group is registered in its HandleMonitor exactly while it has members;
/// the close of the last member removes it.
pub struct HandleGroup {
    path: PathBuf,
    members: Mutex<HashMap<u64, Arc<OpenContext>>>,
    monitor: Weak<HandleMonitor>,
    sink: Arc<dyn DiagnosticSink>,
    dump_level: Level,
}

impl HandleGroup {
    pub(super) fn new(
        path: PathBuf,
        monitor: Weak<HandleMonitor>,
        sink: Arc<dyn DiagnosticSink>,
        dump_level: Level,
    ) -> Self {
        Self {
            path,
            members: Mutex::new(HashMap::new()),
            monitor,
            sink,
            dump_level,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_members(&self) -> MutexGuard<'_, HashMap<u64, Arc<OpenContext>>> {
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock_members().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_members().is_empty()
    }

    /// Wrap `source` into a TrackedStream bound to this group and record it as a member.
    pub(super) fn open(self: &Arc<Self>, source: Box<dyn ReadSource>, ctx: Arc<OpenContext>) -> TrackedStream {
        self.lock_members().insert(ctx.stream_id(), Arc::clone(&ctx));
        TrackedStream::new(
            source,
            ctx,
            Arc::downgrade(self),
            Arc::clone(&self.sink),
            self.dump_level,
        )
    }

    /// Remove a closed member; the last one takes the group out of the registry.
    /// Unknown ids are ignored.
    pub(super) fn notify_closed(&self, stream_id: u64, close_failed: bool) {
        let Some(monitor) = self.monitor.upgrade() else {
            // Реестр уже уничтожен: просто чистим членство
            self.lock_members().remove(&stream_id);
            return;
        };

        let mut map = monitor.lock_groups();
        let (removed, now_empty) = {
            let mut members = self.lock_members();
            let removed = members.remove(&stream_id).is_some();
            (removed, members.is_empty())
        };
        if !removed {
            debug!(
                "notify_closed: stream {} is not a member of {}",
                stream_id,
                self.path.display()
            );
            return;
        }

        monitor.counters.record_close(close_failed);
        debug!("stream {} closed: {}", stream_id, self.path.display());
        if now_empty {
            monitor.remove_group(&mut map, self);
        }
    }

    /// Snapshot of this group; `detailed` includes creation contexts ordered by stream id.
    pub fn summary(&self, detailed: bool) -> FileReport {
        let members = self.lock_members();
        let mut contexts: Vec<Arc<OpenContext>> = if detailed {
            members.values().cloned().collect()
        } else {
            Vec::new()
        };
        contexts.sort_by_key(|c| c.stream_id());
        FileReport::new(&self.path, members.len(), contexts)
    }

    /// Emit path and member count; with `detailed`, also every member's creation context.
    pub fn dump(&self, detailed: bool) {
        self.summary(detailed).emit(&*self.sink, self.dump_level);
    }
}

impl std::fmt::Debug for HandleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandleGroup")
            .field("path", &self.path)
            .field("members", &self.len())
            .finish()
    }
}
