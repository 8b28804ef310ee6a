//! Error types for the transform pipeline

use thiserror::Error;

/// Error raised by a desugaring pass, fatal for the module being compiled
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassError {
    #[error("unsupported syntax in {construct}: {detail}")]
    UnsupportedSyntax {
        construct: &'static str,
        detail: String,
    },
}

impl PassError {
    pub fn unsupported(construct: &'static str, detail: impl Into<String>) -> Self {
        PassError::UnsupportedSyntax {
            construct,
            detail: detail.into(),
        }
    }
}
