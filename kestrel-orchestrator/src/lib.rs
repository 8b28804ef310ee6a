//! Kestrel Orchestrator - build pipeline execution
//!
//! Drives each resolved module from syntax tree to native object file
//! through the external toolchain (assemble, optimize, emit-object), then
//! synthesizes the import map and performs the final link. Supports a
//! blocking execution mode and a polling one with identical observable
//! ordering and error semantics.

pub mod codegen;
pub mod error;
pub mod import_map;
pub mod session;
pub mod stage;
pub mod temp;
pub mod toolchain;

pub use codegen::{CodeGenerator, IrUnit};
pub use error::{BuildError, CodeGenError, ToolchainError};
pub use import_map::CompiledModuleRecord;
pub use session::{BuildArtifacts, BuildSession};
pub use stage::{Stage, ToolchainJob};
pub use temp::TempFileRegistry;
pub use toolchain::{
    SystemToolRunner, ToolHandle, ToolInvocation, ToolRunner, ToolStage, ToolStatus,
};
