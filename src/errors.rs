//! Error type shared by the library operations.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the client utilities.
///
/// `Username` and `Client` carry fully formatted multi-line diagnostics
/// built by [`crate::diagnostics`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The caller's identity could not be resolved.
    #[error("{0}")]
    Username(String),

    /// An external command failed or produced unusable output.
    #[error("{0}")]
    Client(String),

    #[error("Column '{0}' not found in result")]
    ColumnNotFound(String),

    #[error("Can't find user proxy file {}", .0.display())]
    ProxyNotFound(PathBuf),

    #[error("Failed to execute {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// True for failures of identity resolution, including a missing proxy.
    pub fn is_identity_error(&self) -> bool {
        matches!(self, ClientError::Username(_) | ClientError::ProxyNotFound(_))
    }
}
