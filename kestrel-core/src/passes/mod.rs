//! Transform pipeline
//!
//! Desugaring passes over one module's syntax tree, applied in a fixed
//! total order:
//!
//! 1. generator desugaring
//! 2. spread desugaring
//! 3. function-declaration-to-variable normalization
//! 4. anonymous-function naming
//!
//! The order is load-bearing: declaration normalization must run after the
//! structural passes so it sees the final statement shapes, and the naming
//! pass runs last over whatever assignments survive.
//!
//! Passes never catch errors from deeper passes; the pipeline stops the
//! module at the first failure.

pub mod error;
pub mod fold;

mod func_decls;
mod generators;
mod name_anon;
mod spread;

pub use error::PassError;
pub use fold::Fold;
pub use func_decls::FuncDeclsToVars;
pub use generators::DesugarGenerators;
pub use name_anon::NameAnonymousFunctions;
pub use spread::DesugarSpread;

use crate::ast::Program;
use tracing::debug;

/// Runs the fixed pass sequence over one module's tree.
///
/// A fresh instance of every pass is constructed per module, so
/// synthetic-name counters restart for each module.
#[derive(Debug, Default)]
pub struct TransformPipeline;

impl TransformPipeline {
    pub fn new() -> Self {
        Self
    }

    /// Desugar one module's tree, consuming it and returning the rewritten
    /// tree.
    pub fn desugar(&self, module_path: &str, program: Program) -> Result<Program, PassError> {
        debug!(target: "kestrel::transform", module = module_path, pass = "desugar-generators");
        let program = DesugarGenerators::new().fold_program(program)?;

        debug!(target: "kestrel::transform", module = module_path, pass = "desugar-spread");
        let program = DesugarSpread::new().fold_program(program)?;

        debug!(target: "kestrel::transform", module = module_path, pass = "func-decls-to-vars");
        let program = FuncDeclsToVars::new().fold_program(program)?;

        debug!(target: "kestrel::transform", module = module_path, pass = "name-anonymous-functions");
        let program = NameAnonymousFunctions::new().fold_program(program)?;

        Ok(program)
    }
}
