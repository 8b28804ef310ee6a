//! Host-module registry
//!
//! Host modules are precompiled capabilities resolved against a registry
//! instead of the filesystem; programs import them with a `@`-prefixed
//! specifier. The registry is populated from JSON manifest files (`.kst`)
//! found in configured directories. A manifest describes the module's
//! entry-point symbol, exported names, per-target library files and link
//! flags, and optional submodules.

use crate::module::error::HostManifestError;
use kestrel_vfs::VirtualFileSystem;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;

/// A manifest value that is either one string or a per-target table keyed
/// by `platform-arch`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TargetKeyed {
    Single(String),
    PerTarget(HashMap<String, String>),
}

impl TargetKeyed {
    fn select(&self, target_key: &str) -> Option<&str> {
        match self {
            TargetKeyed::Single(s) => Some(s),
            TargetKeyed::PerTarget(table) => table.get(target_key).map(String::as_str),
        }
    }
}

/// On-disk manifest format
#[derive(Debug, Clone, Deserialize)]
pub struct HostModuleManifest {
    pub module_name: Option<String>,
    /// Entry-point symbol; absent for grouping-only manifests
    pub init_function: Option<String>,
    #[serde(default)]
    pub exports: Vec<String>,
    pub module_file: Option<TargetKeyed>,
    pub link_flags: Option<TargetKeyed>,
    #[serde(default)]
    pub submodules: Vec<HostModuleManifest>,
}

/// A registered host module
#[derive(Debug, Clone, PartialEq)]
pub struct HostModuleInfo {
    /// Registry name, without the `@` prefix
    pub name: String,
    /// Entry-point symbol declared in the import map
    pub entry_symbol: String,
    /// Flags appended to the link invocation
    pub link_flags: Vec<String>,
    /// Library archives linked into the executable
    pub library_files: Vec<PathBuf>,
    /// Exported identifiers
    pub exports: Vec<String>,
}

/// Registry of host modules, keyed by name
#[derive(Debug, Default)]
pub struct HostModuleRegistry {
    modules: HashMap<String, HostModuleInfo>,
}

impl HostModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module directly
    pub fn register(&mut self, info: HostModuleInfo) {
        self.modules.insert(info.name.clone(), info);
    }

    /// Look up a module by name (without the `@` prefix)
    pub fn get(&self, name: &str) -> Option<&HostModuleInfo> {
        self.modules.get(name)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Load one manifest file and register the modules it declares.
    ///
    /// `target_key` selects entries from per-target tables
    /// (`"linux-x86-64"` etc).
    pub fn load_manifest(
        &mut self,
        vfs: &dyn VirtualFileSystem,
        path: &Path,
        target_key: &str,
    ) -> Result<(), HostManifestError> {
        let bytes = vfs
            .read_file(path)
            .map_err(|e| HostManifestError::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
        let manifest: HostModuleManifest =
            serde_json::from_slice(&bytes).map_err(|e| HostManifestError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let name = manifest
            .module_name
            .clone()
            .unwrap_or_else(|| default_module_name(path));
        let base_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        self.register_manifest(&base_dir, &name, Vec::new(), Vec::new(), &manifest, target_key)
    }

    fn register_manifest(
        &mut self,
        base_dir: &Path,
        name: &str,
        inherited_flags: Vec<String>,
        inherited_files: Vec<PathBuf>,
        manifest: &HostModuleManifest,
        target_key: &str,
    ) -> Result<(), HostManifestError> {
        let mut link_flags = inherited_flags;
        if let Some(flags) = &manifest.link_flags {
            let selected =
                flags
                    .select(target_key)
                    .ok_or_else(|| HostManifestError::MissingTarget {
                        module: name.to_string(),
                        what: "link flags",
                        target: target_key.to_string(),
                    })?;
            link_flags.extend(selected.split_whitespace().map(str::to_string));
        }

        let mut library_files = inherited_files;
        if let Some(file) = &manifest.module_file {
            let selected =
                file.select(target_key)
                    .ok_or_else(|| HostManifestError::MissingTarget {
                        module: name.to_string(),
                        what: "module file",
                        target: target_key.to_string(),
                    })?;
            library_files.push(base_dir.join(selected));
        }

        if let Some(entry_symbol) = &manifest.init_function {
            self.register(HostModuleInfo {
                name: name.to_string(),
                entry_symbol: entry_symbol.clone(),
                link_flags: link_flags.clone(),
                library_files: library_files.clone(),
                exports: manifest.exports.clone(),
            });
        }

        for sub in &manifest.submodules {
            let sub_name = sub
                .module_name
                .as_ref()
                .ok_or(HostManifestError::MissingSubmoduleName {
                    module: name.to_string(),
                })?;
            self.register_manifest(
                base_dir,
                &format!("{name}/{sub_name}"),
                link_flags.clone(),
                library_files.clone(),
                sub,
                target_key,
            )?;
        }
        Ok(())
    }

    /// Scan directories for `.kst` manifests. A manifest that fails to
    /// load is reported and skipped; a missing directory is skipped
    /// silently.
    pub fn scan_dirs(
        &mut self,
        vfs: &dyn VirtualFileSystem,
        dirs: &[PathBuf],
        target_key: &str,
    ) {
        for dir in dirs {
            let entries = match vfs.read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries {
                if entry.extension().and_then(|e| e.to_str()) != Some("kst") {
                    continue;
                }
                if let Err(e) = self.load_manifest(vfs, &entry, target_key) {
                    warn!(
                        target: "kestrel::resolve",
                        manifest = %entry.display(),
                        "skipping host-module manifest: {e}"
                    );
                }
            }
        }
    }
}

fn default_module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_vfs::MemoryFileSystem;

    const MATH_MANIFEST: &str = r#"{
        "module_name": "math",
        "init_function": "kst_math_init",
        "exports": ["sin", "cos"],
        "module_file": "libkstmath.a",
        "link_flags": "-lm"
    }"#;

    #[test]
    fn test_load_simple_manifest() {
        let fs = MemoryFileSystem::with_files([("/mods/math.kst", MATH_MANIFEST)]);
        let mut registry = HostModuleRegistry::new();
        registry
            .load_manifest(&fs, Path::new("/mods/math.kst"), "linux-x86-64")
            .unwrap();

        let math = registry.get("math").unwrap();
        assert_eq!(math.entry_symbol, "kst_math_init");
        assert_eq!(math.exports, vec!["sin", "cos"]);
        assert_eq!(math.link_flags, vec!["-lm"]);
        assert_eq!(math.library_files, vec![PathBuf::from("/mods/libkstmath.a")]);
    }

    #[test]
    fn test_per_target_tables() {
        let manifest = r#"{
            "module_name": "gfx",
            "init_function": "kst_gfx_init",
            "module_file": {
                "linux-x86-64": "libgfx-linux.a",
                "darwin-x86-64": "libgfx-osx.a"
            }
        }"#;
        let fs = MemoryFileSystem::with_files([("/mods/gfx.kst", manifest)]);

        let mut registry = HostModuleRegistry::new();
        registry
            .load_manifest(&fs, Path::new("/mods/gfx.kst"), "darwin-x86-64")
            .unwrap();
        assert_eq!(
            registry.get("gfx").unwrap().library_files,
            vec![PathBuf::from("/mods/libgfx-osx.a")]
        );
    }

    #[test]
    fn test_missing_target_is_hard_error() {
        let manifest = r#"{
            "module_name": "gfx",
            "init_function": "kst_gfx_init",
            "module_file": { "linux-x86-64": "libgfx-linux.a" }
        }"#;
        let fs = MemoryFileSystem::with_files([("/mods/gfx.kst", manifest)]);

        let mut registry = HostModuleRegistry::new();
        let result = registry.load_manifest(&fs, Path::new("/mods/gfx.kst"), "darwin-aarch64");
        assert!(matches!(
            result.unwrap_err(),
            HostManifestError::MissingTarget { what: "module file", .. }
        ));
        assert!(registry.get("gfx").is_none());
    }

    #[test]
    fn test_submodules_inherit_and_nest_names() {
        let manifest = r#"{
            "module_name": "sys",
            "link_flags": "-lsys",
            "submodules": [
                { "module_name": "fs", "init_function": "kst_sys_fs_init" },
                { "module_name": "net", "init_function": "kst_sys_net_init", "link_flags": "-lnet" }
            ]
        }"#;
        let fs = MemoryFileSystem::with_files([("/mods/sys.kst", manifest)]);

        let mut registry = HostModuleRegistry::new();
        registry
            .load_manifest(&fs, Path::new("/mods/sys.kst"), "linux-x86-64")
            .unwrap();

        // the grouping manifest itself has no init_function, so only the
        // submodules registered
        assert!(registry.get("sys").is_none());
        assert_eq!(registry.get("sys/fs").unwrap().link_flags, vec!["-lsys"]);
        assert_eq!(
            registry.get("sys/net").unwrap().link_flags,
            vec!["-lsys", "-lnet"]
        );
    }

    #[test]
    fn test_scan_dirs_skips_bad_manifests() {
        let fs = MemoryFileSystem::with_files([
            ("/mods/good.kst", MATH_MANIFEST),
            ("/mods/broken.kst", "{ not json"),
            ("/mods/readme.txt", "not a manifest"),
        ]);
        let mut registry = HostModuleRegistry::new();
        registry.scan_dirs(&fs, &[PathBuf::from("/mods")], "linux-x86-64");
        assert_eq!(registry.len(), 1);
        assert!(registry.get("math").is_some());
    }

    #[test]
    fn test_scan_missing_dir_is_silent() {
        let fs = MemoryFileSystem::new();
        let mut registry = HostModuleRegistry::new();
        registry.scan_dirs(&fs, &[PathBuf::from("/nope")], "linux-x86-64");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_name_defaults_to_file_stem() {
        let manifest = r#"{ "init_function": "kst_misc_init" }"#;
        let fs = MemoryFileSystem::with_files([("/mods/misc.kst", manifest)]);
        let mut registry = HostModuleRegistry::new();
        registry
            .load_manifest(&fs, Path::new("/mods/misc.kst"), "linux-x86-64")
            .unwrap();
        assert!(registry.get("misc").is_some());
    }
}
