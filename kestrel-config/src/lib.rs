//! Kestrel Config - Pure configuration data structures
//!
//! This crate contains only data structures and lookup tables, no build
//! logic. It serves as the shared configuration vocabulary across all
//! kestrel crates: target description, build options, toolchain command
//! names, and the log-target naming scheme.

mod options;
mod target;
mod toolchain;

pub use options::{BuildOptions, ExecMode, ExternalModule, ImportVariable, OptionsError};
pub use target::{Arch, ArchInfo, Platform, TargetConfig};
pub use toolchain::ToolchainCommands;

/// Build phase enum for phase-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Resolve,
    Transform,
    Codegen,
    Toolchain,
    Link,
}

impl Phase {
    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Resolve => "resolve",
            Phase::Transform => "transform",
            Phase::Codegen => "codegen",
            Phase::Toolchain => "toolchain",
            Phase::Link => "link",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("kestrel::{}", self.as_str())
    }
}
