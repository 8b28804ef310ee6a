//! Import-map synthesis
//!
//! After every module is objectified, the orchestrator writes one extra
//! translation unit declaring each module's entry-point symbol keyed by
//! its canonical import path, plus an entry for every linked host/external
//! module. The runtime walks these tables to satisfy `require`/`import`
//! lookups; the unit is compiled into the final link alongside the object
//! files.

use kestrel_config::ExternalModule;
use kestrel_core::module::HostModuleInfo;
use kestrel_vfs::{VfsResult, VirtualFileSystem};
use std::fmt::Write as _;
use std::path::Path;

/// One compiled module's contribution to the import map
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModuleRecord {
    /// Canonical import path
    pub path: String,
    /// Top-level symbol assigned by code generation
    pub entry_symbol: String,
}

/// Render and write the import-map unit.
///
/// `entry_path` is the canonical path of the program's main module;
/// `runtime_header` locates the runtime's declarations.
pub fn write_import_map(
    vfs: &dyn VirtualFileSystem,
    map_path: &Path,
    runtime_header: &Path,
    entry_path: &str,
    modules: &[CompiledModuleRecord],
    host_modules: &[HostModuleInfo],
    external_modules: &[ExternalModule],
) -> VfsResult<()> {
    let mut out = String::new();

    let _ = writeln!(out, "#include \"{}\"", runtime_header.display());
    out.push_str("extern \"C\" {\n");
    out.push_str("typedef kstval (*ExternalModuleEntry) (kstval exports);\n");
    out.push_str(
        "typedef struct { const char* name;  ExternalModuleEntry func;  kstval cached_exports KSTVAL_ALIGNMENT; } KstExternalModuleRequire;\n",
    );
    out.push_str("typedef kstval (*ToplevelFunc) (kstval env, kstval self, int argc, kstval *args);\n");
    out.push_str(
        "typedef struct { const char* name;  ToplevelFunc func;  kstval cached_exports KSTVAL_ALIGNMENT; } KstRequire;\n",
    );

    for module in external_modules {
        let _ = writeln!(out, "extern kstval {} (kstval exports);", module.entry_symbol);
    }
    for module in host_modules {
        let _ = writeln!(out, "extern kstval {} (kstval exports);", module.entry_symbol);
    }
    for module in modules {
        let _ = writeln!(
            out,
            "extern kstval {} (kstval env, kstval self, int argc, kstval *args);",
            module.entry_symbol
        );
    }

    out.push_str("KstRequire _kst_require_map[] = {\n");
    for module in modules {
        let _ = writeln!(
            out,
            "  {{ \"{}\", {}, 0 }},",
            sanitize_name(&module.path),
            module.entry_symbol
        );
    }
    out.push_str("  { 0, 0, 0 }\n};\n");

    out.push_str("KstExternalModuleRequire _kst_external_module_require_map[] = {\n");
    for module in external_modules {
        let _ = writeln!(
            out,
            "  {{ \"{}\", {}, 0 }},",
            module.module_name, module.entry_symbol
        );
    }
    for module in host_modules {
        let _ = writeln!(out, "  {{ \"{}\", {}, 0 }},", module.name, module.entry_symbol);
    }
    out.push_str("  { 0, 0, 0 }\n};\n");

    let _ = writeln!(
        out,
        "const char *entry_filename = \"{}\";",
        sanitize_name(entry_path)
    );
    out.push_str("};\n");

    vfs.write_file(map_path, out.as_bytes())
}

/// Require-map key form of a module path: the canonical path without the
/// source suffix.
fn sanitize_name(path: &str) -> &str {
    path.strip_suffix(".js").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_vfs::MemoryFileSystem;
    use std::path::PathBuf;

    fn contents(fs: &MemoryFileSystem, path: &str) -> String {
        String::from_utf8(fs.read_file(Path::new(path)).unwrap()).unwrap()
    }

    #[test]
    fn test_map_lists_every_module() {
        let fs = MemoryFileSystem::new();
        let modules = vec![
            CompiledModuleRecord {
                path: "main".to_string(),
                entry_symbol: "_kst_toplevel_main_0".to_string(),
            },
            CompiledModuleRecord {
                path: "lib".to_string(),
                entry_symbol: "_kst_toplevel_lib_1".to_string(),
            },
        ];

        write_import_map(
            &fs,
            Path::new("/t/map.cpp"),
            Path::new("runtime/kestrel.h"),
            "main",
            &modules,
            &[],
            &[],
        )
        .unwrap();

        let map = contents(&fs, "/t/map.cpp");
        assert!(map.contains("#include \"runtime/kestrel.h\""));
        assert!(map.contains("{ \"main\", _kst_toplevel_main_0, 0 },"));
        assert!(map.contains("{ \"lib\", _kst_toplevel_lib_1, 0 },"));
        assert!(map.contains("extern kstval _kst_toplevel_lib_1"));
        assert!(map.contains("const char *entry_filename = \"main\";"));
    }

    #[test]
    fn test_map_lists_host_and_external_modules() {
        let fs = MemoryFileSystem::new();
        let host = HostModuleInfo {
            name: "sys/fs".to_string(),
            entry_symbol: "kst_sys_fs_init".to_string(),
            link_flags: vec![],
            library_files: vec![],
            exports: vec![],
        };
        let external = ExternalModule {
            library: PathBuf::from("libhttp.a"),
            module_name: "http".to_string(),
            entry_symbol: "http_init".to_string(),
            link_flags: String::new(),
        };

        write_import_map(
            &fs,
            Path::new("/t/map.cpp"),
            Path::new("runtime/kestrel.h"),
            "main",
            &[],
            &[host],
            &[external],
        )
        .unwrap();

        let map = contents(&fs, "/t/map.cpp");
        assert!(map.contains("extern kstval http_init (kstval exports);"));
        assert!(map.contains("{ \"http\", http_init, 0 },"));
        assert!(map.contains("{ \"sys/fs\", kst_sys_fs_init, 0 },"));
    }

    #[test]
    fn test_entry_suffix_stripped() {
        let fs = MemoryFileSystem::new();
        write_import_map(
            &fs,
            Path::new("/t/map.cpp"),
            Path::new("runtime/kestrel.h"),
            "main.js",
            &[],
            &[],
            &[],
        )
        .unwrap();
        assert!(contents(&fs, "/t/map.cpp").contains("entry_filename = \"main\";"));
    }
}
