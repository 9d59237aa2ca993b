//! monitor/stream — поток, который сам снимает себя с учёта при закрытии.

use log::{debug, warn, Level};
use std::fmt;
use std::io::{self, Read};
use std::path::Path;
use std::sync::{Arc, Weak};

use super::group::HandleGroup;
use crate::diag::{DiagnosticSink, OpenContext};
use crate::source::ReadSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Closed,
}

/// A read stream registered in a HandleMonitor.
///
/// All read calls go straight to the underlying source. `close()` (or drop)
/// closes the source and then unregisters the stream exactly once, whether or
/// not the source close succeeded.
pub struct TrackedStream {
    inner: Box<dyn ReadSource>,
    context: Arc<OpenContext>,
    group: Weak<HandleGroup>,
    sink: Arc<dyn DiagnosticSink>,
    dump_level: Level,
    state: StreamState,
}

impl TrackedStream {
    pub(super) fn new(
        inner: Box<dyn ReadSource>,
        context: Arc<OpenContext>,
        group: Weak<HandleGroup>,
        sink: Arc<dyn DiagnosticSink>,
        dump_level: Level,
    ) -> Self {
        Self {
            inner,
            context,
            group,
            sink,
            dump_level,
            state: StreamState::Open,
        }
    }

    pub fn path(&self) -> &Path {
        self.context.path()
    }

    pub fn stream_id(&self) -> u64 {
        self.context.stream_id()
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == StreamState::Closed
    }

    /// Creation-context snapshot taken at open time.
    pub fn context(&self) -> &OpenContext {
        &self.context
    }

    /// Close the underlying source, then unregister.
    ///
    /// Returns the source's close error, if any; unregistration happens regardless.
    /// Closing an already closed stream is a no-op returning Ok(()).
    pub fn close(&mut self) -> io::Result<()> {
        if self.state == StreamState::Closed {
            debug!(
                "stream {} on {} already closed",
                self.stream_id(),
                self.path().display()
            );
            return Ok(());
        }
        self.state = StreamState::Closed;

        let res = self.inner.close();
        if let Err(e) = &res {
            warn!(
                "stream {} on {}: underlying close failed: {}",
                self.stream_id(),
                self.path().display(),
                e
            );
        }
        if let Some(group) = self.group.upgrade() {
            group.notify_closed(self.stream_id(), res.is_err());
        }
        res
    }

    /// Emit the creation context ("opened by ...") of this stream.
    pub fn dump(&self) {
        self.sink
            .emit(self.dump_level, &self.context.describe(), Some(self.context.as_ref()));
    }
}

impl Read for TrackedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }

    fn read_vectored(&mut self, bufs: &mut [io::IoSliceMut<'_>]) -> io::Result<usize> {
        self.inner.read_vectored(bufs)
    }
}

impl ReadSource for TrackedStream {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.inner.read_byte()
    }

    fn skip(&mut self, n: u64) -> io::Result<u64> {
        self.inner.skip(n)
    }

    fn mark(&mut self, read_limit: usize) {
        self.inner.mark(read_limit)
    }

    fn reset(&mut self) -> io::Result<()> {
        self.inner.reset()
    }

    fn mark_supported(&self) -> bool {
        self.inner.mark_supported()
    }

    fn available(&mut self) -> io::Result<u64> {
        self.inner.available()
    }

    fn close(&mut self) -> io::Result<()> {
        TrackedStream::close(self)
    }
}

impl Drop for TrackedStream {
    fn drop(&mut self) {
        if self.state == StreamState::Open {
            // Ошибку закрытия при drop некому вернуть — только логируем
            if let Err(e) = TrackedStream::close(self) {
                debug!("drop: close of {} failed: {}", self.path().display(), e);
            }
        }
    }
}

impl fmt::Debug for TrackedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedStream")
            .field("path", &self.path())
            .field("stream_id", &self.stream_id())
            .field("state", &self.state)
            .finish()
    }
}
