//! Per-build options
//!
//! `BuildOptions` is the immutable configuration surface consumed by the
//! resolver and the build orchestrator. It is constructed by the embedding
//! caller (a CLI front end, a test harness) and never mutated during a
//! build.

use std::fmt;
use std::path::PathBuf;

/// How external toolchain stages are awaited
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecMode {
    /// Block on each stage until it completes
    #[default]
    Sync,
    /// Start each stage and observe completion via non-blocking polling
    Async,
}

/// A `$NAME` substitution applied to import specifiers before resolution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportVariable {
    pub name: String,
    pub value: String,
}

impl ImportVariable {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A precompiled module linked into the final executable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExternalModule {
    /// Static library archive
    pub library: PathBuf,
    /// Name the module is imported under
    pub module_name: String,
    /// Entry-point symbol registered in the import map
    pub entry_symbol: String,
    /// Extra flags appended to the link invocation
    pub link_flags: String,
}

impl ExternalModule {
    /// Parse the `library.a,module-name,entry_symbol,link_flags` form
    pub fn parse(spec: &str) -> Result<Self, OptionsError> {
        let mut parts = spec.splitn(4, ',');
        let library = parts.next().filter(|s| !s.is_empty());
        let module_name = parts.next().filter(|s| !s.is_empty());
        let entry_symbol = parts.next().filter(|s| !s.is_empty());
        let link_flags = parts.next().unwrap_or("");

        match (library, module_name, entry_symbol) {
            (Some(library), Some(module_name), Some(entry_symbol)) => Ok(Self {
                library: PathBuf::from(library),
                module_name: module_name.to_string(),
                entry_symbol: entry_symbol.to_string(),
                link_flags: link_flags.to_string(),
            }),
            _ => Err(OptionsError::InvalidExternalModule {
                spec: spec.to_string(),
            }),
        }
    }
}

/// Error raised while constructing build options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// Malformed external module spec
    InvalidExternalModule { spec: String },
}

impl fmt::Display for OptionsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsError::InvalidExternalModule { spec } => write!(
                f,
                "invalid external module spec '{spec}' (expected library.a,module-name,entry_symbol,link_flags)"
            ),
        }
    }
}

impl std::error::Error for OptionsError {}

/// Immutable per-build configuration
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// Suppress progress messages
    pub quiet: bool,
    /// Final link output path; defaults to `<entry>.exe` next to the entry file
    pub output_filename: Option<PathBuf>,
    /// Skip temp-file cleanup at build end
    pub leave_temp_files: bool,
    /// Precompiled modules linked into the import map
    pub external_modules: Vec<ExternalModule>,
    /// Arguments appended verbatim to the link invocation
    pub extra_link_args: Vec<String>,
    /// iOS SDK version used for darwin cross targets
    pub ios_sdk: String,
    /// Minimum iOS version for darwin cross targets
    pub ios_min: String,
    /// Directory transient build products are written to
    pub scratch_dir: PathBuf,
    /// Directory holding the runtime archive
    pub runtime_dir: PathBuf,
    /// Directory holding prebuilt support libraries
    pub support_dir: PathBuf,
    /// Directories scanned for host-module manifests
    pub host_module_dirs: Vec<PathBuf>,
    /// Import-specifier substitutions
    pub import_variables: Vec<ImportVariable>,
    /// Toolchain stage execution mode
    pub exec_mode: ExecMode,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            quiet: false,
            output_filename: None,
            leave_temp_files: false,
            external_modules: Vec::new(),
            extra_link_args: Vec::new(),
            ios_sdk: "7.1".to_string(),
            ios_min: "7.0".to_string(),
            scratch_dir: std::env::temp_dir(),
            runtime_dir: PathBuf::from("runtime"),
            support_dir: PathBuf::from("external-deps"),
            host_module_dirs: Vec::new(),
            import_variables: Vec::new(),
            exec_mode: ExecMode::Sync,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn with_output_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_filename = Some(path.into());
        self
    }

    pub fn with_leave_temp_files(mut self, leave: bool) -> Self {
        self.leave_temp_files = leave;
        self
    }

    pub fn with_external_module(mut self, module: ExternalModule) -> Self {
        self.external_modules.push(module);
        self
    }

    pub fn with_extra_link_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_link_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_runtime_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.runtime_dir = dir.into();
        self
    }

    pub fn with_support_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.support_dir = dir.into();
        self
    }

    pub fn with_host_module_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.host_module_dirs.push(dir.into());
        self
    }

    pub fn with_import_variable(mut self, var: ImportVariable) -> Self {
        self.import_variables.push(var);
        self
    }

    pub fn with_exec_mode(mut self, mode: ExecMode) -> Self {
        self.exec_mode = mode;
        self
    }
}
