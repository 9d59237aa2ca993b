//! Readable resources handed out by the filesystem layer.
//!
//! `ReadSource` is `Read` plus the stream-control calls a file-backed input
//! stream offers (skip/mark/reset/available/close). `FileSource` implements it
//! on top of `std::fs::File` with seek-based marks.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

/// A byte-readable resource with explicit close.
pub trait ReadSource: Read + Send {
    /// Read a single byte; `Ok(None)` at end of stream.
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut b = [0u8; 1];
        loop {
            match self.read(&mut b) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(b[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Skip up to `n` bytes, returning how many were actually skipped.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        io::copy(&mut Read::take(&mut *self, n), &mut io::sink())
    }

    /// Remember the current position. `read_limit` is advisory.
    fn mark(&mut self, _read_limit: usize) {}

    /// Return to the last mark.
    fn reset(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "mark/reset not supported",
        ))
    }

    fn mark_supported(&self) -> bool {
        false
    }

    /// Bytes that can be read without blocking (estimate).
    fn available(&mut self) -> io::Result<u64> {
        Ok(0)
    }

    /// Release the underlying resource.
    fn close(&mut self) -> io::Result<()>;
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::other("stream closed")
}

/// `std::fs::File` as a `ReadSource`.
#[derive(Debug)]
pub struct FileSource {
    file: Option<File>,
    mark: Option<u64>,
}

impl FileSource {
    pub fn new(file: File) -> Self {
        Self {
            file: Some(file),
            mark: None,
        }
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file.as_mut().ok_or_else(closed_error)
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file_mut()?.read(buf)
    }
}

impl ReadSource for FileSource {
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let f = self.file_mut()?;
        let pos = f.stream_position()?;
        let len = f.metadata()?.len();
        // Не уходим за EOF: skip возвращает фактически пропущенное
        let step = n.min(len.saturating_sub(pos));
        f.seek(SeekFrom::Start(pos + step))?;
        Ok(step)
    }

    fn mark(&mut self, _read_limit: usize) {
        self.mark = self.file.as_mut().and_then(|f| f.stream_position().ok());
    }

    fn reset(&mut self) -> io::Result<()> {
        let pos = self
            .mark
            .ok_or_else(|| io::Error::other("reset without mark"))?;
        self.file_mut()?.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn mark_supported(&self) -> bool {
        true
    }

    fn available(&mut self) -> io::Result<u64> {
        let f = self.file_mut()?;
        let pos = f.stream_position()?;
        let len = f.metadata()?.len();
        Ok(len.saturating_sub(pos))
    }

    fn close(&mut self) -> io::Result<()> {
        // Drop closes the descriptor; a second close is a no-op.
        self.file.take();
        self.mark = None;
        Ok(())
    }
}
