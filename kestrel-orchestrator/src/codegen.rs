//! Code generation collaborator seam
//!
//! The orchestrator hands each desugared module tree to a [`CodeGenerator`]
//! and receives an in-memory IR unit, which it serializes into the scratch
//! directory for the external toolchain stages. The export table resolved
//! for the whole build is passed through so the generator can resolve
//! cross-module references and fold exported constants.

use crate::error::CodeGenError;
use kestrel_config::TargetConfig;
use kestrel_core::ast::Program;
use kestrel_core::module::ExportTable;

/// An intermediate-representation unit for one module
pub trait IrUnit {
    /// The stable top-level entry-point symbol, referenced by the
    /// synthesized import map
    fn entry_symbol(&self) -> &str;

    /// Serialized form written to the per-module IR file
    fn serialize(&self) -> Vec<u8>;
}

/// Turns a desugared module tree into an IR unit
pub trait CodeGenerator {
    /// Generate IR for one module.
    ///
    /// `base_name` is unique per build and is used to derive symbol and
    /// file names; `exports` is the read-only export table covering every
    /// module in the build.
    fn generate(
        &self,
        ast: Program,
        base_name: &str,
        exports: &ExportTable,
        target: &TargetConfig,
    ) -> Result<Box<dyn IrUnit>, CodeGenError>;
}
