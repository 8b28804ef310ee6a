//! Module graph data structures
//!
//! A build works over a set of [`ModuleInfo`]s keyed by canonical path,
//! plus one [`ExportTable`] mapping every canonical path to its export
//! metadata. Both are produced by the resolver before compilation starts
//! and are read-only afterwards.

pub mod error;
pub mod host;
mod resolver;

pub use error::{HostManifestError, ResolveError};
pub use host::{HostModuleInfo, HostModuleManifest, HostModuleRegistry};
pub use resolver::ModuleGraphResolver;

use crate::ast::{Literal, Program};
use std::collections::btree_map;
use std::collections::{BTreeMap, HashMap};

/// How a module is provided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleKind {
    /// Parsed from source text
    Source,
    /// Resolved against the host-module registry
    Host,
}

/// Export metadata for one module
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleExports {
    entries: BTreeMap<String, Option<Literal>>,
    has_default: bool,
}

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an exported identifier, with its constant value when the
    /// exported binding is a literal `const`.
    pub fn add(&mut self, name: impl Into<String>, constant: Option<Literal>) {
        let name = name.into();
        if name == "default" {
            self.has_default = true;
        }
        self.entries.insert(name, constant);
    }

    pub fn set_has_default(&mut self) {
        self.has_default = true;
    }

    pub fn has_default_export(&self) -> bool {
        self.has_default
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// The recorded constant value of an export, if it has one
    pub fn constant(&self, name: &str) -> Option<&Literal> {
        self.entries.get(name).and_then(|c| c.as_ref())
    }

    pub fn names(&self) -> btree_map::Keys<'_, String, Option<Literal>> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One resolved module
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    /// Canonical path: suffix-free and relative to the toplevel root for
    /// source modules, `@`-prefixed for host modules. Unique across the
    /// build.
    pub path: String,
    /// Owned syntax tree; `None` for host modules
    pub ast: Option<Program>,
    /// Resolved import paths in discovery order, deduplicated
    pub imports: Vec<String>,
    pub exports: ModuleExports,
    pub kind: ModuleKind,
}

impl ModuleInfo {
    /// Transfer the syntax tree out for the transform pipeline
    pub fn take_ast(&mut self) -> Option<Program> {
        self.ast.take()
    }

    pub fn is_host(&self) -> bool {
        self.kind == ModuleKind::Host
    }
}

/// Build-wide mapping from canonical module path to export metadata
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    modules: HashMap<String, ModuleExports>,
}

impl ExportTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a module's exports; each canonical path is inserted exactly
    /// once per build.
    pub fn insert(&mut self, path: impl Into<String>, exports: ModuleExports) {
        self.modules.insert(path.into(), exports);
    }

    pub fn get(&self, path: &str) -> Option<&ModuleExports> {
        self.modules.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.modules.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// The resolver's result: every reachable module in discovery order, the
/// populated export table, and the host modules that were imported.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    pub modules: Vec<ModuleInfo>,
    pub exports: ExportTable,
    pub host_modules: Vec<HostModuleInfo>,
}

impl ModuleGraph {
    /// Number of source modules (the ones that go through codegen)
    pub fn source_module_count(&self) -> usize {
        self.modules.iter().filter(|m| !m.is_host()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exports_default_flag_via_add() {
        let mut e = ModuleExports::new();
        e.add("default", None);
        assert!(e.has_default_export());
        assert!(e.contains("default"));
    }

    #[test]
    fn test_exports_constants() {
        let mut e = ModuleExports::new();
        e.add("PI", Some(Literal::Number(3.14)));
        e.add("f", None);
        assert_eq!(e.constant("PI"), Some(&Literal::Number(3.14)));
        assert_eq!(e.constant("f"), None);
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn test_export_table() {
        let mut table = ExportTable::new();
        let mut e = ModuleExports::new();
        e.add("f", None);
        table.insert("lib", e);
        assert!(table.contains("lib"));
        assert!(table.get("lib").unwrap().contains("f"));
        assert!(!table.contains("other"));
    }
}
