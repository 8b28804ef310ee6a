//! Kestrel Core - front-end data structures and transforms
//!
//! This crate holds the syntax tree and its rewrite engine, the parser
//! collaborator seam, the module graph resolver with its export table and
//! host-module registry, and the desugaring pipeline. Code generation and
//! toolchain orchestration live in `kestrel-orchestrator`.

pub mod ast;
pub mod module;
pub mod parse;
pub mod passes;

pub use ast::{Element, Expr, Function, Literal, Program, Stmt};
pub use module::{
    ExportTable, HostModuleInfo, HostModuleRegistry, ModuleExports, ModuleGraph,
    ModuleGraphResolver, ModuleInfo, ResolveError,
};
pub use parse::{Parser, SyntaxError};
pub use passes::{PassError, TransformPipeline};
