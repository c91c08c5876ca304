use std::{fmt, io};

/// Errors surfaced by the filesystem engine.
#[derive(Debug)]
pub enum FsError {
    /// the image is smaller than one full block group
    DeviceTooSmall { size: u64, required: u64 },
    /// a short or failed seek, read or write against the backing store
    Io(io::Error),
    /// a path component with no matching directory entry
    NotFound { component: String },
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsError::DeviceTooSmall { size, required } => {
                write!(f, "device is {size} bytes, need at least {required}")
            }
            FsError::Io(err) => write!(f, "I/O error: {err}"),
            FsError::NotFound { component } => write!(f, "no entry named {component:?}"),
        }
    }
}

impl std::error::Error for FsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FsError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for FsError {
    fn from(err: io::Error) -> Self {
        FsError::Io(err)
    }
}

pub type Result<T> = std::result::Result<T, FsError>;
