use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Errors produced while validating parameters or compressing a single file.
///
/// A compressed file that turns out not to be smaller than its source is not
/// an error; it is reported as an unsuccessful [`crate::CompressionOutcome`].
#[derive(Debug)]
pub enum CompressError {
    /// Quality was non-numeric or outside 1..=100. Raised before a batch starts.
    InvalidQuality(String),
    /// Target width was non-numeric or zero.
    InvalidWidth(String),
    /// The input could not be opened or decoded as an image.
    Load {
        path: PathBuf,
        source: image::ImageError,
    },
    /// The re-encoded image could not be written.
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    /// Filesystem failure while measuring or cleaning up a file.
    Io { path: PathBuf, source: io::Error },
}

impl CompressError {
    /// The file this error relates to, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            CompressError::InvalidQuality(_) | CompressError::InvalidWidth(_) => None,
            CompressError::Load { path, .. }
            | CompressError::Encode { path, .. }
            | CompressError::Io { path, .. } => Some(path),
        }
    }
}

impl fmt::Display for CompressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompressError::InvalidQuality(raw) => write!(
                f,
                "Please enter a valid quality percentage between 1-100 (got {raw:?})"
            ),
            CompressError::InvalidWidth(raw) => {
                write!(f, "Invalid target width {raw:?}: expected a positive integer")
            }
            CompressError::Load { path, source } => {
                write!(f, "Failed to load image {}: {}", path.display(), source)
            }
            CompressError::Encode { path, source } => {
                write!(f, "Failed to encode image {}: {}", path.display(), source)
            }
            CompressError::Io { path, source } => {
                write!(f, "IO error on {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for CompressError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CompressError::InvalidQuality(_) | CompressError::InvalidWidth(_) => None,
            CompressError::Load { source, .. } | CompressError::Encode { source, .. } => {
                Some(source)
            }
            CompressError::Io { source, .. } => Some(source),
        }
    }
}
