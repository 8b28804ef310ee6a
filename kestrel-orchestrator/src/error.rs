//! Build-phase error types

use crate::toolchain::ToolStage;
use kestrel_core::module::ResolveError;
use kestrel_core::passes::PassError;
use kestrel_vfs::VfsError;
use thiserror::Error;

/// Code generation failure reported by the collaborator
#[derive(Error, Debug, Clone, PartialEq)]
#[error("code generation failed: {message}")]
pub struct CodeGenError {
    pub message: String,
}

impl CodeGenError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// External toolchain stage failure, fatal for the build
#[derive(Error, Debug)]
pub enum ToolchainError {
    #[error("{stage} failed: '{program}' exited with code {code}")]
    Stage {
        stage: ToolStage,
        program: String,
        code: i32,
    },

    #[error("{stage} failed: '{program}' was terminated by a signal")]
    Terminated { stage: ToolStage, program: String },

    #[error("{stage} failed: could not run '{program}': {message}")]
    Spawn {
        stage: ToolStage,
        program: String,
        message: String,
    },
}

/// Top-level build error
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("no entry files given")]
    NoEntryFiles,

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("{module}: {source}")]
    Pass {
        module: String,
        #[source]
        source: PassError,
    },

    #[error("{module}: {source}")]
    CodeGen {
        module: String,
        #[source]
        source: CodeGenError,
    },

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("unsupported target {target}: no {what}")]
    UnsupportedTarget { target: String, what: String },

    #[error(transparent)]
    Vfs(#[from] VfsError),
}
