//! Sidecar error types

use std::path::PathBuf;
use thiserror::Error;

/// Sidecar read/parse error
#[derive(Error, Debug)]
pub enum SidecarError {
    #[error("sidecar not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("invalid value count '{value}' for header '{name}' on line {line}")]
    InvalidCount {
        name: String,
        line: usize,
        value: String,
    },

    #[error("record for header '{name}' truncated at end of input")]
    Truncated { name: String },

    #[error("sidecar {} is not valid UTF-8 (byte {offset})", .path.display())]
    Encoding { path: PathBuf, offset: usize },

    #[error("failed to read sidecar: {0}")]
    Io(#[from] std::io::Error),
}

impl SidecarError {
    /// Absent sidecar means "no extra headers", not a failure
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the file exists but does not follow the sidecar format
    pub const fn is_format(&self) -> bool {
        matches!(
            self,
            Self::InvalidCount { .. } | Self::Truncated { .. } | Self::Encoding { .. }
        )
    }
}
