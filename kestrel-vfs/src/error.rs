//! VFS error types

use thiserror::Error;

/// Result type for VFS operations
pub type VfsResult<T> = Result<T, VfsError>;

/// Error type for VFS operations
#[derive(Error, Debug)]
pub enum VfsError {
    #[error("path not found: {path}")]
    NotFound { path: String },

    #[error("invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("IO error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{message}")]
    Custom { message: String },
}

impl VfsError {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        VfsError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
