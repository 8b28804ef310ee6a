//! Module graph resolution
//!
//! Starting from the entry specifiers, discovers every transitively
//! imported module, canonicalizes and deduplicates their paths, rewrites
//! each import declaration's `source_path` to the canonical form, and
//! records export metadata into the build-wide export table.
//!
//! Canonical paths are suffix-free and relative to the toplevel root, so a
//! module imported through different relative specifiers from different
//! directories resolves to one canonical module. `@`-prefixed specifiers
//! resolve against the host-module registry instead of the filesystem.

use crate::ast::{Expr, Program, Stmt, VarKind};
use crate::module::error::ResolveError;
use crate::module::host::HostModuleRegistry;
use crate::module::{ExportTable, ModuleExports, ModuleGraph, ModuleInfo, ModuleKind};
use crate::parse::Parser;
use kestrel_config::ImportVariable;
use kestrel_vfs::{read_to_string, VirtualFileSystem};
use std::collections::{HashSet, VecDeque};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Source file suffix appended to suffix-free specifiers
const SOURCE_SUFFIX: &str = ".js";
/// Module resolved for a directory specifier
const INDEX_MODULE: &str = "index.js";

/// Builds the complete module graph for a set of entry files
pub struct ModuleGraphResolver<'a> {
    vfs: &'a dyn VirtualFileSystem,
    parser: &'a dyn Parser,
    root_dir: PathBuf,
    host_registry: &'a HostModuleRegistry,
    import_variables: Vec<ImportVariable>,
}

impl<'a> ModuleGraphResolver<'a> {
    pub fn new(
        vfs: &'a dyn VirtualFileSystem,
        parser: &'a dyn Parser,
        root_dir: impl Into<PathBuf>,
        host_registry: &'a HostModuleRegistry,
    ) -> Self {
        Self {
            vfs,
            parser,
            root_dir: root_dir.into(),
            host_registry,
            import_variables: Vec::new(),
        }
    }

    pub fn with_import_variables(mut self, vars: &[ImportVariable]) -> Self {
        self.import_variables = vars.to_vec();
        self
    }

    /// Resolve the graph reachable from `entries`, in discovery order.
    ///
    /// Each canonical path is parsed and graph-walked exactly once; cycles
    /// terminate because a visited module is never re-queued.
    pub fn resolve(&self, entries: &[String]) -> Result<ModuleGraph, ResolveError> {
        let mut graph = ModuleGraph::default();
        let mut visited: HashSet<String> = HashSet::new();
        let mut queued: HashSet<String> = HashSet::new();
        let mut work: VecDeque<String> = VecDeque::new();

        for entry in entries {
            let canonical = self.canonical_entry(entry);
            if queued.insert(canonical.clone()) {
                work.push_back(canonical);
            }
        }

        while let Some(spec) = work.pop_front() {
            if !visited.insert(spec.clone()) {
                continue;
            }

            let file = match self.locate(&spec) {
                Ok(file) => file,
                Err(tried) => {
                    if let Some(name) = spec.strip_prefix('@') {
                        self.resolve_host(&spec, name, &mut graph)?;
                        continue;
                    }
                    return Err(ResolveError::ModuleNotFound {
                        specifier: spec,
                        tried,
                    });
                }
            };

            debug!(target: "kestrel::resolve", module = %spec, file = %file.display(), "parsing");
            let source = read_to_string(self.vfs, &file).map_err(|e| ResolveError::Read {
                path: file.clone(),
                source: e,
            })?;
            let mut ast = self.parser.parse(&file, &source)?;

            let (imports, exports) = self.scan(&mut ast, &file)?;

            for import in &imports {
                if !visited.contains(import) && queued.insert(import.clone()) {
                    work.push_back(import.clone());
                }
            }

            graph.exports.insert(spec.clone(), exports.clone());
            graph.modules.push(ModuleInfo {
                path: spec,
                ast: Some(ast),
                imports,
                exports,
                kind: ModuleKind::Source,
            });
        }

        Ok(graph)
    }

    fn resolve_host(
        &self,
        spec: &str,
        name: &str,
        graph: &mut ModuleGraph,
    ) -> Result<(), ResolveError> {
        let info = self
            .host_registry
            .get(name)
            .ok_or_else(|| ResolveError::NativeModuleNotFound {
                specifier: spec.to_string(),
            })?;

        let mut exports = ModuleExports::new();
        for export in &info.exports {
            exports.add(export.clone(), None);
        }

        graph.exports.insert(spec.to_string(), exports.clone());
        graph.modules.push(ModuleInfo {
            path: spec.to_string(),
            ast: None,
            imports: Vec::new(),
            exports,
            kind: ModuleKind::Host,
        });
        graph.host_modules.push(info.clone());
        Ok(())
    }

    /// Find the source file for a canonical specifier: a directory's index
    /// module, or the specifier with the source suffix appended. Returns
    /// the probed paths on failure.
    fn locate(&self, spec: &str) -> Result<PathBuf, Vec<PathBuf>> {
        let mut tried = Vec::new();
        let base = if Path::new(spec).is_absolute() {
            PathBuf::from(spec)
        } else {
            self.root_dir.join(spec)
        };

        if self.vfs.is_dir(&base) {
            let index = base.join(INDEX_MODULE);
            tried.push(index.clone());
            if self.vfs.is_file(&index) {
                return Ok(index);
            }
        }

        let with_suffix = PathBuf::from(format!("{}{}", base.display(), SOURCE_SUFFIX));
        tried.push(with_suffix.clone());
        if self.vfs.is_file(&with_suffix) {
            return Ok(with_suffix);
        }

        Err(tried)
    }

    /// Collect and canonicalize imports, record exports, and rewrite each
    /// declaration's `source_path` in place.
    fn scan(
        &self,
        program: &mut Program,
        file: &Path,
    ) -> Result<(Vec<String>, ModuleExports), ResolveError> {
        let dir = file.parent().unwrap_or(Path::new("")).to_path_buf();
        let file_name = file.display().to_string();
        let mut imports: Vec<String> = Vec::new();
        let mut exports = ModuleExports::new();

        let mut add_import = |canonical: String| {
            if !imports.contains(&canonical) {
                imports.push(canonical);
            }
        };

        for stmt in &mut program.body {
            match stmt {
                Stmt::Import(decl) => {
                    let raw = decl
                        .source
                        .as_string_literal()
                        .ok_or_else(|| ResolveError::InvalidImportSource {
                            file: file_name.clone(),
                        })?;
                    let canonical = self.canonicalize_import(raw, &dir);
                    add_import(canonical.clone());
                    decl.source_path = Some(canonical);
                }
                Stmt::ExportNamed(decl) => {
                    if decl.declaration.is_some()
                        && (!decl.specifiers.is_empty() || decl.source.is_some())
                    {
                        return Err(ResolveError::UnsupportedExport {
                            file: file_name,
                            detail: "declaration combined with specifiers or a source"
                                .to_string(),
                        });
                    }

                    if let Some(source) = &decl.source {
                        let raw = source.as_string_literal().ok_or_else(|| {
                            ResolveError::InvalidImportSource {
                                file: file_name.clone(),
                            }
                        })?;
                        let canonical = self.canonicalize_import(raw, &dir);
                        add_import(canonical.clone());
                        decl.source_path = Some(canonical);
                    }

                    if !decl.specifiers.is_empty() {
                        for spec in &decl.specifiers {
                            exports.add(spec.exported.clone(), None);
                        }
                    } else if let Some(declaration) = &decl.declaration {
                        match declaration.as_ref() {
                            Stmt::FunctionDecl(func) => {
                                let name = func.id.clone().ok_or_else(|| {
                                    ResolveError::UnsupportedExport {
                                        file: file_name.clone(),
                                        detail: "exported function has no name".to_string(),
                                    }
                                })?;
                                exports.add(name, None);
                            }
                            Stmt::VarDecl(var) => {
                                for declarator in &var.declarations {
                                    let constant = match (&var.kind, &declarator.init) {
                                        (VarKind::Const, Some(Expr::Literal(lit))) => {
                                            Some(lit.clone())
                                        }
                                        _ => None,
                                    };
                                    exports.add(declarator.id.clone(), constant);
                                }
                            }
                            other => {
                                return Err(ResolveError::UnsupportedExport {
                                    file: file_name,
                                    detail: format!("unhandled declaration: {other:?}"),
                                });
                            }
                        }
                    } else {
                        return Err(ResolveError::UnsupportedExport {
                            file: file_name,
                            detail: "export with no declaration or specifiers".to_string(),
                        });
                    }
                }
                Stmt::ExportDefault(_) => {
                    exports.add("default", None);
                }
                _ => {}
            }
        }

        Ok((imports, exports))
    }

    /// Canonicalize an entry specifier: strip the suffix, make it relative
    /// to the toplevel root where possible.
    fn canonical_entry(&self, entry: &str) -> String {
        if entry.starts_with('@') {
            return entry.to_string();
        }
        let trimmed = entry.strip_suffix(SOURCE_SUFFIX).unwrap_or(entry);
        let path = normalize_path(Path::new(trimmed));
        self.relative_to_root(&path)
    }

    /// Canonicalize an import specifier found in `dir`'s module, applying
    /// import-variable substitution first.
    fn canonicalize_import(&self, raw: &str, dir: &Path) -> String {
        let mut spec = raw.to_string();
        for var in &self.import_variables {
            spec = spec.replace(&format!("${}", var.name), &var.value);
        }

        if spec.starts_with('@') {
            return spec;
        }

        let trimmed = spec.strip_suffix(SOURCE_SUFFIX).unwrap_or(&spec);
        let resolved = if Path::new(trimmed).is_absolute() {
            normalize_path(Path::new(trimmed))
        } else {
            normalize_path(&dir.join(trimmed))
        };
        self.relative_to_root(&resolved)
    }

    fn relative_to_root(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root_dir) {
            Ok(rel) => slash_string(rel),
            Err(_) => slash_string(path),
        }
    }
}

/// Resolve `.` and `..` components lexically
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push("..");
                }
            }
            other => result.push(other),
        }
    }
    result
}

fn slash_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;
    use crate::ast::Literal;
    use crate::parse::SyntaxError;
    use kestrel_vfs::MemoryFileSystem;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Parser scripted per file path; counts how often each file parses.
    struct FakeParser {
        programs: HashMap<String, Program>,
        parse_counts: RefCell<HashMap<String, u32>>,
    }

    impl FakeParser {
        fn new(programs: Vec<(&str, Program)>) -> Self {
            Self {
                programs: programs
                    .into_iter()
                    .map(|(p, t)| (p.to_string(), t))
                    .collect(),
                parse_counts: RefCell::new(HashMap::new()),
            }
        }

        fn count(&self, file: &str) -> u32 {
            self.parse_counts.borrow().get(file).copied().unwrap_or(0)
        }
    }

    impl Parser for FakeParser {
        fn parse(&self, file: &Path, _source: &str) -> Result<Program, SyntaxError> {
            let key = file.display().to_string();
            *self.parse_counts.borrow_mut().entry(key.clone()).or_insert(0) += 1;
            self.programs
                .get(&key)
                .cloned()
                .ok_or_else(|| SyntaxError::new(file, 1, 1, "unexpected token"))
        }
    }

    fn empty_registry() -> HostModuleRegistry {
        HostModuleRegistry::new()
    }

    #[test]
    fn test_single_module_no_imports() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let parser = FakeParser::new(vec![("/main.js", program(vec![]))]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        assert_eq!(graph.modules.len(), 1);
        assert_eq!(graph.modules[0].path, "main");
        assert_eq!(graph.modules[0].kind, ModuleKind::Source);
    }

    #[test]
    fn test_aliased_specifiers_resolve_once() {
        // main imports "./lib" and "sub/mod"; sub/mod imports "../lib":
        // both specifiers canonicalize to "lib", which is parsed once.
        let fs = MemoryFileSystem::with_files([
            ("/main.js", ""),
            ("/lib.js", ""),
            ("/sub/mod.js", ""),
        ]);
        let parser = FakeParser::new(vec![
            (
                "/main.js",
                program(vec![
                    import(vec![("f", Some("f"))], string("./lib")),
                    import(vec![("m", None)], string("./sub/mod")),
                ]),
            ),
            ("/lib.js", program(vec![])),
            (
                "/sub/mod.js",
                program(vec![import(vec![("f", Some("f"))], string("../lib"))]),
            ),
        ]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        let paths: Vec<&str> = graph.modules.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["main", "lib", "sub/mod"]);
        assert_eq!(parser.count("/lib.js"), 1);

        // both importers recorded the identical canonical source_path
        let source_paths: Vec<Option<String>> = graph
            .modules
            .iter()
            .flat_map(|m| m.ast.as_ref().map(|a| &a.body).into_iter().flatten())
            .filter_map(|s| match s {
                Stmt::Import(decl) => Some(decl.source_path.clone()),
                _ => None,
            })
            .collect();
        assert!(source_paths.contains(&Some("lib".to_string())));
        assert_eq!(
            source_paths.iter().filter(|p| **p == Some("lib".to_string())).count(),
            2
        );
    }

    #[test]
    fn test_import_cycle_terminates() {
        let fs = MemoryFileSystem::with_files([("/a.js", ""), ("/b.js", "")]);
        let parser = FakeParser::new(vec![
            ("/a.js", program(vec![import(vec![], string("./b"))])),
            ("/b.js", program(vec![import(vec![], string("./a"))])),
        ]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["a.js".to_string()]).unwrap();
        assert_eq!(graph.modules.len(), 2);
        assert_eq!(parser.count("/a.js"), 1);
        assert_eq!(parser.count("/b.js"), 1);
    }

    #[test]
    fn test_directory_resolves_to_index_module() {
        let fs = MemoryFileSystem::with_files([("/main.js", ""), ("/util/index.js", "")]);
        let parser = FakeParser::new(vec![
            ("/main.js", program(vec![import(vec![], string("./util"))])),
            ("/util/index.js", program(vec![])),
        ]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        assert_eq!(graph.modules[1].path, "util");
        assert_eq!(parser.count("/util/index.js"), 1);
    }

    #[test]
    fn test_module_not_found_lists_tried_paths() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let parser = FakeParser::new(vec![(
            "/main.js",
            program(vec![import(vec![], string("./missing"))]),
        )]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let err = resolver.resolve(&["main.js".to_string()]).unwrap_err();
        match err {
            ResolveError::ModuleNotFound { specifier, tried } => {
                assert_eq!(specifier, "missing");
                assert!(tried.contains(&PathBuf::from("/missing.js")));
            }
            other => panic!("expected ModuleNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_non_string_import_source_is_rejected() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let parser = FakeParser::new(vec![(
            "/main.js",
            program(vec![import(vec![], ident("dynamic"))]),
        )]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let err = resolver.resolve(&["main.js".to_string()]).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidImportSource { .. }));
    }

    #[test]
    fn test_host_module_resolution() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let parser = FakeParser::new(vec![(
            "/main.js",
            program(vec![import(vec![("read", Some("read"))], string("@sys/fs"))]),
        )]);
        let mut registry = HostModuleRegistry::new();
        registry.register(crate::module::HostModuleInfo {
            name: "sys/fs".to_string(),
            entry_symbol: "kst_sys_fs_init".to_string(),
            link_flags: vec![],
            library_files: vec![],
            exports: vec!["read".to_string()],
        });
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        assert_eq!(graph.modules.len(), 2);
        assert_eq!(graph.modules[1].path, "@sys/fs");
        assert_eq!(graph.modules[1].kind, ModuleKind::Host);
        assert!(graph.exports.get("@sys/fs").unwrap().contains("read"));
        assert_eq!(graph.host_modules.len(), 1);
    }

    #[test]
    fn test_unregistered_host_module_fails() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let parser = FakeParser::new(vec![(
            "/main.js",
            program(vec![import(vec![], string("@nope"))]),
        )]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let err = resolver.resolve(&["main.js".to_string()]).unwrap_err();
        assert!(matches!(err, ResolveError::NativeModuleNotFound { .. }));
    }

    #[test]
    fn test_syntax_error_aborts() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        // no tree scripted for /main.js -> FakeParser reports a syntax error
        let parser = FakeParser::new(vec![]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let err = resolver.resolve(&["main.js".to_string()]).unwrap_err();
        assert!(matches!(err, ResolveError::Syntax(_)));
    }

    #[test]
    fn test_export_metadata_recorded() {
        let fs = MemoryFileSystem::with_files([("/lib.js", "")]);
        let parser = FakeParser::new(vec![(
            "/lib.js",
            program(vec![
                export_decl(var_decl(VarKind::Const, "PI", Some(number(3.14)))),
                export_decl(function_decl("f", vec![], vec![])),
                export_default(function_expr(crate::ast::Function::new(None, vec![], vec![]))),
            ]),
        )]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["lib.js".to_string()]).unwrap();
        let exports = graph.exports.get("lib").unwrap();
        assert_eq!(exports.constant("PI"), Some(&Literal::Number(3.14)));
        assert!(exports.contains("f"));
        assert_eq!(exports.constant("f"), None);
        assert!(exports.has_default_export());
    }

    #[test]
    fn test_reexport_source_is_followed() {
        let fs = MemoryFileSystem::with_files([("/main.js", ""), ("/inner.js", "")]);
        let parser = FakeParser::new(vec![
            (
                "/main.js",
                program(vec![export_specifiers(
                    vec![("g", "g")],
                    Some(string("./inner")),
                )]),
            ),
            ("/inner.js", program(vec![])),
        ]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        assert_eq!(graph.modules.len(), 2);
        assert!(graph.exports.get("main").unwrap().contains("g"));
    }

    #[test]
    fn test_invalid_export_shape_rejected() {
        let fs = MemoryFileSystem::with_files([("/main.js", "")]);
        let mut bad = match export_decl(function_decl("f", vec![], vec![])) {
            Stmt::ExportNamed(decl) => decl,
            other => panic!("expected export, got {other:?}"),
        };
        bad.specifiers.push(crate::ast::ExportSpecifier {
            local: "x".to_string(),
            exported: "x".to_string(),
        });
        let parser = FakeParser::new(vec![(
            "/main.js",
            program(vec![Stmt::ExportNamed(bad)]),
        )]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry);

        let err = resolver.resolve(&["main.js".to_string()]).unwrap_err();
        assert!(matches!(err, ResolveError::UnsupportedExport { .. }));
    }

    #[test]
    fn test_import_variable_substitution() {
        let fs = MemoryFileSystem::with_files([("/main.js", ""), ("/vendor/widgets.js", "")]);
        let parser = FakeParser::new(vec![
            (
                "/main.js",
                program(vec![import(vec![], string("$VENDOR/widgets"))]),
            ),
            ("/vendor/widgets.js", program(vec![])),
        ]);
        let registry = empty_registry();
        let resolver = ModuleGraphResolver::new(&fs, &parser, "/", &registry)
            .with_import_variables(&[ImportVariable::new("VENDOR", "./vendor")]);

        let graph = resolver.resolve(&["main.js".to_string()]).unwrap();
        assert_eq!(graph.modules[1].path, "vendor/widgets");
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/a/b/../c/./d")),
            PathBuf::from("/a/c/d")
        );
        assert_eq!(normalize_path(Path::new("a/./b")), PathBuf::from("a/b"));
    }
}
