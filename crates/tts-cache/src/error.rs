//! Error types for the artifact cache

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum CacheError {
    /// Stat of an artifact failed for a reason other than not-found
    Stat {
        path: PathBuf,
        source: Box<std::io::Error>,
    },
    /// The cache directory could not be listed
    Scan {
        dir: PathBuf,
        source: Box<std::io::Error>,
    },
    Io(Box<std::io::Error>),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Stat { path, source } => {
                write!(f, "Failed to stat {}: {}", path.display(), source)
            }
            CacheError::Scan { dir, source } => {
                write!(f, "Failed to scan cache dir {}: {}", dir.display(), source)
            }
            CacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Stat { source, .. } => Some(source.as_ref()),
            CacheError::Scan { source, .. } => Some(source.as_ref()),
            CacheError::Io(err) => Some(err.as_ref()),
        }
    }
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;
