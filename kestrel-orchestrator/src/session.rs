//! Build session
//!
//! One [`BuildSession`] per build invocation owns the configuration, the
//! collaborator handles, the temp-file registry and the fresh-name
//! counter; there is no process-global state. `build` drives the whole
//! flow: resolve the module graph, desugar and code-generate each module,
//! run its external toolchain stages, synthesize the import map, link, and
//! clean up transients.
//!
//! Modules are compiled strictly sequentially in discovery order in both
//! execution modes; a failed stage aborts the build before the next module
//! or the link begins.

use crate::codegen::CodeGenerator;
use crate::error::{BuildError, ToolchainError};
use crate::import_map::{write_import_map, CompiledModuleRecord};
use crate::stage::ToolchainJob;
use crate::temp::TempFileRegistry;
use crate::toolchain::{
    link_target_args, path_prepend, platform_libraries, runtime_archive, support_library,
    ToolInvocation, ToolRunner, ToolStage, ToolStatus,
};
use kestrel_config::{BuildOptions, ExecMode, Phase, TargetConfig, ToolchainCommands};
use kestrel_core::module::{HostModuleInfo, HostModuleRegistry, ModuleGraphResolver};
use kestrel_core::parse::Parser;
use kestrel_core::passes::TransformPipeline;
use kestrel_vfs::VirtualFileSystem;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// What a successful build produced
#[derive(Debug)]
pub struct BuildArtifacts {
    /// The linked executable
    pub output_path: PathBuf,
    /// Per-module records, in compile order
    pub modules: Vec<CompiledModuleRecord>,
    /// Object files handed to the link
    pub object_files: Vec<PathBuf>,
}

/// Per-build context threading configuration and collaborators
pub struct BuildSession<'a> {
    vfs: &'a dyn VirtualFileSystem,
    parser: &'a dyn Parser,
    codegen: &'a dyn CodeGenerator,
    runner: &'a mut dyn ToolRunner,
    root_dir: PathBuf,
    target: TargetConfig,
    options: BuildOptions,
    commands: ToolchainCommands,
    fresh_counter: u32,
}

impl<'a> BuildSession<'a> {
    pub fn new(
        vfs: &'a dyn VirtualFileSystem,
        parser: &'a dyn Parser,
        codegen: &'a dyn CodeGenerator,
        runner: &'a mut dyn ToolRunner,
        root_dir: impl Into<PathBuf>,
        target: TargetConfig,
        options: BuildOptions,
    ) -> Self {
        Self {
            vfs,
            parser,
            codegen,
            runner,
            root_dir: root_dir.into(),
            target,
            options,
            commands: ToolchainCommands::default(),
            fresh_counter: 0,
        }
    }

    /// Override the toolchain command names (e.g.
    /// `ToolchainCommands::from_env()` to honor `LLVM_SUFFIX`)
    pub fn with_commands(mut self, commands: ToolchainCommands) -> Self {
        self.commands = commands;
        self
    }

    /// Run a complete build for the given entry specifiers.
    pub fn build(&mut self, entries: &[String]) -> Result<BuildArtifacts, BuildError> {
        if entries.is_empty() {
            return Err(BuildError::NoEntryFiles);
        }

        let mut host_registry = HostModuleRegistry::new();
        host_registry.scan_dirs(self.vfs, &self.options.host_module_dirs, &self.target.key());

        let resolver =
            ModuleGraphResolver::new(self.vfs, self.parser, self.root_dir.clone(), &host_registry)
                .with_import_variables(&self.options.import_variables);
        let graph = resolver.resolve(entries)?;
        info!(
            target: "kestrel::resolve",
            phase = Phase::Resolve.as_str(),
            modules = graph.modules.len(),
            "module graph resolved"
        );

        let mut temp = TempFileRegistry::new();
        let result = self.compile_and_link(entries, graph, &mut temp);

        // cleanup runs on success and failure alike, unless retention was
        // requested
        if self.options.leave_temp_files {
            temp.discard();
        } else {
            temp.cleanup(self.vfs);
        }
        result
    }

    fn compile_and_link(
        &mut self,
        entries: &[String],
        graph: kestrel_core::module::ModuleGraph,
        temp: &mut TempFileRegistry,
    ) -> Result<BuildArtifacts, BuildError> {
        let pipeline = TransformPipeline::new();
        let mut records: Vec<CompiledModuleRecord> = Vec::new();
        let mut object_files: Vec<PathBuf> = Vec::new();
        let host_modules = graph.host_modules;
        let export_table = graph.exports;

        for mut module in graph.modules {
            let Some(ast) = module.take_ast() else {
                continue;
            };
            if !self.options.quiet {
                info!(
                    target: "kestrel::codegen",
                    phase = Phase::Codegen.as_str(),
                    "COMPILE {}", module.path
                );
            }

            let base_name = self.fresh_name(module_stem(&module.path));
            let mut job = ToolchainJob::new(
                &module.path,
                &self.options.scratch_dir,
                &base_name,
                &self.target,
            );

            let ast = pipeline.desugar(&module.path, ast).map_err(|e| BuildError::Pass {
                module: module.path.clone(),
                source: e,
            })?;
            job.advance(); // Parsed -> Desugared

            let ir = self
                .codegen
                .generate(ast, &base_name, &export_table, &self.target)
                .map_err(|e| BuildError::CodeGen {
                    module: module.path.clone(),
                    source: e,
                })?;

            for path in job.transient_paths() {
                temp.register(path.clone());
            }
            debug!(target: "kestrel::codegen", ir = %job.ir_path.display(), "writing IR unit");
            self.vfs.write_file(&job.ir_path, &ir.serialize())?;
            job.advance(); // Desugared -> IrGenerated

            records.push(CompiledModuleRecord {
                path: module.path.clone(),
                entry_symbol: ir.entry_symbol().to_string(),
            });

            self.drive(&mut job)?;
            object_files.push(job.object_path.clone());
        }

        // the import map always runs after every module is objectified
        let entry = entries[0].clone();
        let map_stem = self.fresh_name(module_stem(&entry));
        let map_path = self
            .options
            .scratch_dir
            .join(format!("{map_stem}-import-map.cpp"));
        let runtime_header = self.options.runtime_dir.join("kestrel.h");
        write_import_map(
            self.vfs,
            &map_path,
            &runtime_header,
            &entry,
            &records,
            &host_modules,
            &self.options.external_modules,
        )?;
        temp.register(map_path.clone());

        let output_path = self
            .options
            .output_filename
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{entry}.exe")));
        if !self.options.quiet {
            info!(
                target: "kestrel::link",
                phase = Phase::Link.as_str(),
                "LINK {}", output_path.display()
            );
        }

        let invocation =
            self.link_invocation(&output_path, &object_files, &map_path, &host_modules)?;
        self.execute(ToolStage::Link, &invocation)?;

        Ok(BuildArtifacts {
            output_path,
            modules: records,
            object_files,
        })
    }

    /// Run a module's remaining external stages, advancing the state
    /// machine on each completion.
    fn drive(&mut self, job: &mut ToolchainJob) -> Result<(), BuildError> {
        while let Some((stage, invocation)) = job.next_invocation(&self.commands, &self.target) {
            match self.execute(stage, &invocation) {
                Ok(()) => job.advance(),
                Err(e) => {
                    job.fail();
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, stage: ToolStage, invocation: &ToolInvocation) -> Result<(), BuildError> {
        debug!(
            target: "kestrel::toolchain",
            stage = stage.as_str(),
            "executing '{}'", invocation.command_line()
        );

        let status = match self.options.exec_mode {
            ExecMode::Sync => self.runner.run(invocation),
            ExecMode::Async => poll_to_completion(self.runner, invocation),
        }
        .map_err(|e| ToolchainError::Spawn {
            stage,
            program: invocation.program.clone(),
            message: e.to_string(),
        })?;

        match status {
            ToolStatus::Exited(0) => Ok(()),
            ToolStatus::Exited(code) => Err(ToolchainError::Stage {
                stage,
                program: invocation.program.clone(),
                code,
            }
            .into()),
            ToolStatus::Terminated => Err(ToolchainError::Terminated {
                stage,
                program: invocation.program.clone(),
            }
            .into()),
            ToolStatus::Running => Err(ToolchainError::Spawn {
                stage,
                program: invocation.program.clone(),
                message: "runner reported completion while still running".to_string(),
            }
            .into()),
        }
    }

    fn link_invocation(
        &self,
        output_path: &Path,
        object_files: &[PathBuf],
        map_path: &Path,
        host_modules: &[HostModuleInfo],
    ) -> Result<ToolInvocation, BuildError> {
        let mut args = link_target_args(&self.target, &self.options);
        if self.target.little_endian() {
            args.insert(0, "-DIS_LITTLE_ENDIAN=1".to_string());
        }
        args.push(format!(
            "-DKESTREL_BITS_PER_WORD={}",
            self.target.pointer_size()
        ));
        args.push("-o".to_string());
        args.push(output_path.display().to_string());
        for object in object_files {
            args.push(object.display().to_string());
        }
        // the require map includes runtime headers from the source tree
        args.push("-I.".to_string());
        args.push(map_path.display().to_string());
        args.push(runtime_archive(&self.target, &self.options).display().to_string());
        args.push(support_library(&self.target, &self.options)?.display().to_string());

        for host in host_modules {
            for lib in &host.library_files {
                args.push(lib.display().to_string());
            }
            args.extend(host.link_flags.iter().cloned());
        }
        for external in &self.options.external_modules {
            args.push(external.library.display().to_string());
            args.extend(
                external
                    .link_flags
                    .replace('\n', " ")
                    .split_whitespace()
                    .map(String::from),
            );
        }
        args.extend(platform_libraries(&self.target));
        args.extend(self.options.extra_link_args.iter().cloned());

        let mut invocation = ToolInvocation::new(&self.commands.linker, args);
        invocation.path_prepend = path_prepend(&self.target);
        Ok(invocation)
    }

    /// Per-build unique base name for a module's generated files
    fn fresh_name(&mut self, stem: &str) -> String {
        let n = self.fresh_counter;
        self.fresh_counter += 1;
        format!("{stem}-{n}")
    }
}

/// Observe completion of a started stage without blocking on it
fn poll_to_completion(
    runner: &mut dyn ToolRunner,
    invocation: &ToolInvocation,
) -> std::io::Result<ToolStatus> {
    let mut handle = runner.spawn(invocation)?;
    loop {
        match handle.poll()? {
            ToolStatus::Running => std::thread::sleep(Duration::from_millis(1)),
            done => return Ok(done),
        }
    }
}

fn module_stem(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_stem() {
        assert_eq!(module_stem("main"), "main");
        assert_eq!(module_stem("sub/mod"), "mod");
        assert_eq!(module_stem("a/b/c"), "c");
    }
}
