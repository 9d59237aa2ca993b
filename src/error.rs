//! Error types for the handle monitor.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the monitor and the host filesystem.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The file to open (or delete/rename) does not exist.
    #[error("not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Any other I/O failure of the underlying primitive.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Refused a destructive operation because streams are still open.
    #[error("{} still has {count} open stream(s)", .path.display())]
    StillOpen { path: PathBuf, count: usize },
}

impl HandleError {
    /// Classify an `io::Error` for `path` (NotFound is kept distinct).
    pub fn from_io(path: impl Into<PathBuf>, e: io::Error) -> Self {
        let path = path.into();
        if e.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path)
        } else {
            Self::Io { path, source: e }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Convert HandleError to std::io::Error for callers living in io-land.
impl From<HandleError> for io::Error {
    fn from(e: HandleError) -> Self {
        match e {
            HandleError::NotFound(p) => {
                io::Error::new(io::ErrorKind::NotFound, p.display().to_string())
            }
            HandleError::Io { source, .. } => source,
            busy @ HandleError::StillOpen { .. } => io::Error::other(busy.to_string()),
        }
    }
}

pub type HandleResult<T> = Result<T, HandleError>;
