//! Parser collaborator seam
//!
//! The driver does not parse source text itself; an embedding supplies an
//! implementation of [`Parser`]. Tests use scripted implementations keyed
//! by file path.

use crate::ast::Program;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A parse failure, fatal for the whole build
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{file}:{line}:{column}: {message}")]
pub struct SyntaxError {
    pub file: PathBuf,
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl SyntaxError {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

/// Turns source text into a syntax tree
pub trait Parser {
    /// Parse one module's source text
    fn parse(&self, file: &Path, source: &str) -> Result<Program, SyntaxError>;
}
