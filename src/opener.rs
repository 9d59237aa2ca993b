//! File-opening primitive used by the monitor.

use std::fs::File;
use std::io;
use std::path::Path;

use crate::source::{FileSource, ReadSource};

/// Opens a file for reading and returns a byte-readable resource.
pub trait FileOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSource>>;
}

/// Opens real files via `std::fs::File::open`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOpener;

impl FileOpener for LocalOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn ReadSource>> {
        let f = File::open(path)?;
        Ok(Box::new(FileSource::new(f)))
    }
}
