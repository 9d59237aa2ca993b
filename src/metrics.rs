//! Lightweight counters for one monitor instance.
//!
//! Потокобезопасные атомарные счётчики; живут внутри HandleMonitor,
//! так что несколько мониторов (и параллельные тесты) не мешают друг другу.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct MonitorMetrics {
    streams_opened: AtomicU64,
    streams_closed: AtomicU64,
    open_failures: AtomicU64,
    close_errors: AtomicU64,
    groups_created: AtomicU64,
    groups_removed: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub streams_opened: u64,
    pub streams_closed: u64,
    pub open_failures: u64,
    pub close_errors: u64,
    pub groups_created: u64,
    pub groups_removed: u64,
}

impl MetricsSnapshot {
    /// Streams opened and not yet closed.
    pub fn streams_live(&self) -> u64 {
        self.streams_opened.saturating_sub(self.streams_closed)
    }

    pub fn groups_live(&self) -> u64 {
        self.groups_created.saturating_sub(self.groups_removed)
    }
}

impl MonitorMetrics {
    pub(crate) fn record_open(&self) {
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_close(&self, failed: bool) {
        self.streams_closed.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.close_errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_open_failure(&self) {
        self.open_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_group_created(&self) {
        self.groups_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_group_removed(&self) {
        self.groups_removed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            streams_closed: self.streams_closed.load(Ordering::Relaxed),
            open_failures: self.open_failures.load(Ordering::Relaxed),
            close_errors: self.close_errors.load(Ordering::Relaxed),
            groups_created: self.groups_created.load(Ordering::Relaxed),
            groups_removed: self.groups_removed.load(Ordering::Relaxed),
        }
    }
}
