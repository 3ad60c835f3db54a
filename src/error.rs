//! Request serving error types

use crate::sidecar::SidecarError;
use hyper::StatusCode;
use thiserror::Error;

/// Error produced while serving a static request
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request path: {0}")]
    Path(String),

    #[error("content paused for another {retry_after}s")]
    Paused { retry_after: u64 },

    #[error("sidecar error: {0}")]
    Sidecar(#[from] SidecarError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServeError {
    /// Status code reported to the client
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Path(_) => StatusCode::BAD_REQUEST,
            Self::Paused { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Sidecar(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error points at a server-side fault worth logging at error level
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::Sidecar(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ServeError::NotFound("/x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServeError::Path("%zz".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServeError::Paused { retry_after: 3 }.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        let io_err = ServeError::from(io::Error::new(io::ErrorKind::Other, "disk"));
        assert_eq!(io_err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(io_err.is_server_error());
        assert!(!ServeError::NotFound("/x".into()).is_server_error());
    }
}
