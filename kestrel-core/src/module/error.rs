//! Resolution-phase error types

use crate::parse::SyntaxError;
use kestrel_vfs::VfsError;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised while building the module graph, fatal for the build
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("module '{specifier}' not found (tried: {tried:?})")]
    ModuleNotFound {
        specifier: String,
        tried: Vec<PathBuf>,
    },

    #[error("{file}: import sources must be string literals")]
    InvalidImportSource { file: String },

    #[error("host module '{specifier}' not found")]
    NativeModuleNotFound { specifier: String },

    #[error("{file}: unsupported export declaration: {detail}")]
    UnsupportedExport { file: String, detail: String },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Error raised while loading host-module manifests
#[derive(Error, Debug)]
pub enum HostManifestError {
    #[error("failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: VfsError,
    },

    #[error("failed to parse manifest '{path}': {message}")]
    Parse { path: PathBuf, message: String },

    #[error("module '{module}' has no {what} for target '{target}'")]
    MissingTarget {
        module: String,
        what: &'static str,
        target: String,
    },

    #[error("submodule of '{module}' is missing a module_name")]
    MissingSubmoduleName { module: String },
}
