//! External toolchain invocations
//!
//! Argument lists for the four external stages, derived purely from
//! `TargetConfig` and `BuildOptions` plus prior-stage output paths, and the
//! [`ToolRunner`] seam through which the orchestrator executes them. The
//! production runner shells out with `std::process`; tests substitute a
//! recording runner.

use crate::error::BuildError;
use kestrel_config::{Arch, BuildOptions, Platform, TargetConfig, ToolchainCommands};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

const SIM_PLATFORM_BASE: &str =
    "/Applications/Xcode.app/Contents/Developer/Platforms/iPhoneSimulator.platform";
const DEV_PLATFORM_BASE: &str =
    "/Applications/Xcode.app/Contents/Developer/Platforms/iPhoneOS.platform";

/// One external stage of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStage {
    Assemble,
    Optimize,
    EmitObject,
    Link,
}

impl ToolStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStage::Assemble => "assemble",
            ToolStage::Optimize => "optimize",
            ToolStage::EmitObject => "emit-object",
            ToolStage::Link => "link",
        }
    }
}

impl fmt::Display for ToolStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-derived external command
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Directory prepended to PATH for this invocation
    pub path_prepend: Option<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            path_prepend: None,
        }
    }

    /// The command line as one string, for logging
    pub fn command_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// IR -> bitcode
pub fn assemble_invocation(
    commands: &ToolchainCommands,
    ir_path: &Path,
    assembled_path: &Path,
) -> ToolInvocation {
    ToolInvocation::new(
        &commands.assembler,
        vec![format!("-o={}", path_arg(assembled_path)), path_arg(ir_path)],
    )
}

/// bitcode -> optimized IR
pub fn optimize_invocation(
    commands: &ToolchainCommands,
    assembled_path: &Path,
    optimized_path: &Path,
) -> ToolInvocation {
    ToolInvocation::new(
        &commands.optimizer,
        vec![
            "-O2".to_string(),
            "-strip-dead-prototypes".to_string(),
            "-S".to_string(),
            format!("-o={}", path_arg(optimized_path)),
            path_arg(assembled_path),
        ],
    )
}

/// Architecture-specific flags for the object emitter
pub fn objgen_args(target: &TargetConfig) -> Vec<String> {
    let mut args = vec![
        format!("-march={}", target.arch.info().objgen_name),
        "-disable-fp-elim".to_string(),
    ];
    match target.arch {
        Arch::Arm => args.extend(
            [
                "-mtriple=thumbv7-apple-ios",
                "-mattr=+v6",
                "-relocation-model=pic",
                "-soft-float",
            ]
            .map(String::from),
        ),
        Arch::Aarch64 => args.extend(
            [
                "-mtriple=arm64-apple-ios",
                "-mattr=+fp-armv8",
                "-relocation-model=pic",
            ]
            .map(String::from),
        ),
        _ => {}
    }
    args
}

/// optimized IR -> object file
pub fn emit_object_invocation(
    commands: &ToolchainCommands,
    target: &TargetConfig,
    optimized_path: &Path,
    object_path: &Path,
) -> ToolInvocation {
    let mut args = objgen_args(target);
    args.push("-filetype=obj".to_string());
    args.push(format!("-o={}", path_arg(object_path)));
    args.push(path_arg(optimized_path));
    ToolInvocation::new(&commands.object_emitter, args)
}

/// Platform/arch portion of the link arguments
pub fn link_target_args(target: &TargetConfig, options: &BuildOptions) -> Vec<String> {
    let arch_args = vec!["-arch".to_string(), target.arch.info().linker_name.to_string()];

    match target.platform {
        Platform::Linux => {
            // single-arch linux toolchains warn on an explicit -arch
            if target.arch == Arch::X86_64 {
                Vec::new()
            } else {
                arch_args
            }
        }
        Platform::Darwin => match target.arch {
            Arch::X86_64 => arch_args,
            Arch::X86 => {
                let mut args = arch_args;
                args.push("-isysroot".to_string());
                args.push(format!(
                    "{SIM_PLATFORM_BASE}/Developer/SDKs/iPhoneSimulator{}.sdk",
                    options.ios_sdk
                ));
                args.push(format!("-miphoneos-version-min={}", options.ios_min));
                args
            }
            _ => {
                let mut args = arch_args;
                args.push("-isysroot".to_string());
                args.push(format!(
                    "{DEV_PLATFORM_BASE}/Developer/SDKs/iPhoneOS{}.sdk",
                    options.ios_sdk
                ));
                args.push(format!("-miphoneos-version-min={}", options.ios_min));
                args
            }
        },
    }
}

/// System libraries and frameworks for the target
pub fn platform_libraries(target: &TargetConfig) -> Vec<String> {
    match target.platform {
        Platform::Linux => vec!["-lpthread".to_string()],
        Platform::Darwin => {
            let mut libs = vec!["-framework".to_string(), "Foundation".to_string()];
            if target.arch == Arch::X86_64 {
                libs.extend(["-framework", "AppKit"].map(String::from));
            } else {
                libs.extend(
                    [
                        "-framework",
                        "UIKit",
                        "-framework",
                        "GLKit",
                        "-framework",
                        "OpenGLES",
                        "-framework",
                        "CoreGraphics",
                    ]
                    .map(String::from),
                );
            }
            libs
        }
    }
}

/// The runtime archive linked into every executable
pub fn runtime_archive(target: &TargetConfig, options: &BuildOptions) -> PathBuf {
    let name = match (target.platform, target.arch) {
        (Platform::Darwin, arch) if arch != Arch::X86_64 => "libkestrel.a.ios",
        _ => "libkestrel.a",
    };
    options.runtime_dir.join(name)
}

/// The prebuilt regex support library for the target; a platform/arch pair
/// with no prebuilt library is an unsupported target.
pub fn support_library(
    target: &TargetConfig,
    options: &BuildOptions,
) -> Result<PathBuf, BuildError> {
    let subdir = match (target.platform, target.arch) {
        (Platform::Linux, Arch::X86_64) | (Platform::Linux, Arch::X86) => "pcre-linux",
        (Platform::Darwin, Arch::X86_64) => "pcre-osx",
        (Platform::Darwin, Arch::X86) => "pcre-iossim",
        (Platform::Darwin, Arch::Arm) => "pcre-iosdev",
        (Platform::Darwin, Arch::Aarch64) => "pcre-iosdevaarch64",
        _ => {
            return Err(BuildError::UnsupportedTarget {
                target: target.to_string(),
                what: "prebuilt support library (libpcre16)".to_string(),
            })
        }
    };
    Ok(options
        .support_dir
        .join(subdir)
        .join(".libs")
        .join("libpcre16.a"))
}

/// Directory prepended to PATH when the target needs a platform toolchain
pub fn path_prepend(target: &TargetConfig) -> Option<String> {
    match (target.platform, target.arch) {
        (Platform::Darwin, Arch::X86) => Some(format!("{SIM_PLATFORM_BASE}/Developer/usr/bin")),
        (Platform::Darwin, Arch::Arm) | (Platform::Darwin, Arch::Aarch64) => {
            Some(format!("{DEV_PLATFORM_BASE}/Developer/usr/bin"))
        }
        _ => None,
    }
}

/// Result of waiting on (or polling) an external tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Still running (poll only)
    Running,
    /// Exited with a status code
    Exited(i32),
    /// Killed by a signal, no status code
    Terminated,
}

/// A started external tool awaiting completion
pub trait ToolHandle {
    /// Non-blocking completion check
    fn poll(&mut self) -> std::io::Result<ToolStatus>;
}

/// Executes tool invocations, blocking or started-then-polled
pub trait ToolRunner {
    /// Run to completion, blocking
    fn run(&mut self, invocation: &ToolInvocation) -> std::io::Result<ToolStatus>;

    /// Start without blocking; completion is observed via the handle
    fn spawn(&mut self, invocation: &ToolInvocation) -> std::io::Result<Box<dyn ToolHandle>>;
}

/// Runner backed by `std::process`
#[derive(Debug, Default)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(invocation: &ToolInvocation) -> Command {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.stdin(Stdio::null());
        if let Some(prepend) = &invocation.path_prepend {
            let path = std::env::var("PATH").unwrap_or_default();
            cmd.env("PATH", format!("{prepend}:{path}"));
        }
        cmd
    }
}

fn status_of(status: ExitStatus) -> ToolStatus {
    match status.code() {
        Some(code) => ToolStatus::Exited(code),
        None => ToolStatus::Terminated,
    }
}

impl ToolRunner for SystemToolRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> std::io::Result<ToolStatus> {
        let status = Self::command(invocation).status()?;
        Ok(status_of(status))
    }

    fn spawn(&mut self, invocation: &ToolInvocation) -> std::io::Result<Box<dyn ToolHandle>> {
        let child = Self::command(invocation).spawn()?;
        Ok(Box::new(SystemToolHandle { child }))
    }
}

struct SystemToolHandle {
    child: Child,
}

impl ToolHandle for SystemToolHandle {
    fn poll(&mut self) -> std::io::Result<ToolStatus> {
        match self.child.try_wait()? {
            None => Ok(ToolStatus::Running),
            Some(status) => Ok(status_of(status)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> BuildOptions {
        BuildOptions::default()
    }

    #[test]
    fn test_assemble_invocation() {
        let commands = ToolchainCommands::default();
        let inv = assemble_invocation(&commands, Path::new("/t/m.ll"), Path::new("/t/m.bc"));
        assert_eq!(inv.program, "llvm-as");
        assert_eq!(inv.args, vec!["-o=/t/m.bc", "/t/m.ll"]);
    }

    #[test]
    fn test_optimize_invocation() {
        let commands = ToolchainCommands::default();
        let inv = optimize_invocation(&commands, Path::new("/t/m.bc"), Path::new("/t/m.opt.ll"));
        assert_eq!(inv.program, "opt");
        assert_eq!(
            inv.args,
            vec!["-O2", "-strip-dead-prototypes", "-S", "-o=/t/m.opt.ll", "/t/m.bc"]
        );
    }

    #[test]
    fn test_objgen_args_per_arch() {
        let linux = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert_eq!(objgen_args(&linux), vec!["-march=x86-64", "-disable-fp-elim"]);

        let arm = TargetConfig::new(Platform::Darwin, Arch::Arm);
        let args = objgen_args(&arm);
        assert!(args.contains(&"-mtriple=thumbv7-apple-ios".to_string()));
        assert!(args.contains(&"-soft-float".to_string()));

        let aarch64 = TargetConfig::new(Platform::Darwin, Arch::Aarch64);
        let args = objgen_args(&aarch64);
        assert!(args.contains(&"-mattr=+fp-armv8".to_string()));
    }

    #[test]
    fn test_link_target_args() {
        let linux64 = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert!(link_target_args(&linux64, &opts()).is_empty());

        let osx = TargetConfig::new(Platform::Darwin, Arch::X86_64);
        assert_eq!(link_target_args(&osx, &opts()), vec!["-arch", "x86_64"]);

        let sim = TargetConfig::new(Platform::Darwin, Arch::X86);
        let args = link_target_args(&sim, &opts());
        assert!(args.contains(&"-isysroot".to_string()));
        assert!(args.iter().any(|a| a.contains("iPhoneSimulator7.1.sdk")));
        assert!(args.contains(&"-miphoneos-version-min=7.0".to_string()));
    }

    #[test]
    fn test_platform_libraries() {
        let linux = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert_eq!(platform_libraries(&linux), vec!["-lpthread"]);

        let osx = TargetConfig::new(Platform::Darwin, Arch::X86_64);
        let libs = platform_libraries(&osx);
        assert!(libs.contains(&"AppKit".to_string()));

        let ios = TargetConfig::new(Platform::Darwin, Arch::Arm);
        let libs = platform_libraries(&ios);
        assert!(libs.contains(&"UIKit".to_string()));
        assert!(!libs.contains(&"AppKit".to_string()));
    }

    #[test]
    fn test_runtime_archive_selection() {
        let linux = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert_eq!(
            runtime_archive(&linux, &opts()),
            PathBuf::from("runtime/libkestrel.a")
        );

        let ios = TargetConfig::new(Platform::Darwin, Arch::Aarch64);
        assert_eq!(
            runtime_archive(&ios, &opts()),
            PathBuf::from("runtime/libkestrel.a.ios")
        );
    }

    #[test]
    fn test_support_library_paths() {
        let linux = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert_eq!(
            support_library(&linux, &opts()).unwrap(),
            PathBuf::from("external-deps/pcre-linux/.libs/libpcre16.a")
        );

        let ios64 = TargetConfig::new(Platform::Darwin, Arch::Aarch64);
        assert!(support_library(&ios64, &opts())
            .unwrap()
            .to_string_lossy()
            .contains("pcre-iosdevaarch64"));
    }

    #[test]
    fn test_support_library_missing_pair_is_unsupported() {
        let linux_arm = TargetConfig::new(Platform::Linux, Arch::Aarch64);
        let err = support_library(&linux_arm, &opts()).unwrap_err();
        assert!(matches!(err, BuildError::UnsupportedTarget { .. }));
    }

    #[test]
    fn test_path_prepend() {
        let linux = TargetConfig::new(Platform::Linux, Arch::X86_64);
        assert!(path_prepend(&linux).is_none());

        let sim = TargetConfig::new(Platform::Darwin, Arch::X86);
        assert!(path_prepend(&sim).unwrap().contains("iPhoneSimulator"));

        let dev = TargetConfig::new(Platform::Darwin, Arch::Arm);
        assert!(path_prepend(&dev).unwrap().contains("iPhoneOS"));
    }

    #[test]
    fn test_command_line_rendering() {
        let inv = ToolInvocation::new("llc", vec!["-march=x86-64".to_string()]);
        assert_eq!(inv.command_line(), "llc -march=x86-64");
    }
}
