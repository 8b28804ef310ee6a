//! Per-module build state machine
//!
//! Each module advances `Parsed -> Desugared -> IrGenerated -> Assembled
//! -> Optimized -> Objectified` through a single transition function; the
//! synchronous and polling drivers differ only in how they wait for an
//! external stage, never in how the machine advances. `Failed` is terminal
//! and reachable from any non-terminal state.

use crate::toolchain::{
    assemble_invocation, emit_object_invocation, optimize_invocation, ToolInvocation, ToolStage,
};
use kestrel_config::{TargetConfig, ToolchainCommands};
use std::path::{Path, PathBuf};

/// Lifecycle states of one module
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Discovered,
    Parsed,
    Desugared,
    IrGenerated,
    Assembled,
    Optimized,
    Objectified,
    Failed,
}

impl Stage {
    /// The state after one successful step, if any remains
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Discovered => Some(Stage::Parsed),
            Stage::Parsed => Some(Stage::Desugared),
            Stage::Desugared => Some(Stage::IrGenerated),
            Stage::IrGenerated => Some(Stage::Assembled),
            Stage::Assembled => Some(Stage::Optimized),
            Stage::Optimized => Some(Stage::Objectified),
            Stage::Objectified | Stage::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }
}

/// Per-module toolchain state and file paths
#[derive(Debug, Clone)]
pub struct ToolchainJob {
    pub module_path: String,
    pub ir_path: PathBuf,
    pub assembled_path: PathBuf,
    pub optimized_path: PathBuf,
    pub object_path: PathBuf,
    pub stage: Stage,
}

impl ToolchainJob {
    /// Derive the four stage output paths for a module from its unique
    /// base name and the target.
    pub fn new(
        module_path: impl Into<String>,
        scratch_dir: &Path,
        base_name: &str,
        target: &TargetConfig,
    ) -> Self {
        let stem = format!("{base_name}-{target}");
        Self {
            module_path: module_path.into(),
            ir_path: scratch_dir.join(format!("{stem}.ll")),
            assembled_path: scratch_dir.join(format!("{stem}.bc")),
            optimized_path: scratch_dir.join(format!("{stem}.opt.ll")),
            object_path: scratch_dir.join(format!("{stem}.o")),
            stage: Stage::Parsed,
        }
    }

    /// All transient paths this job will produce
    pub fn transient_paths(&self) -> [&PathBuf; 4] {
        [
            &self.ir_path,
            &self.assembled_path,
            &self.optimized_path,
            &self.object_path,
        ]
    }

    /// The external invocation that performs the next stage, when the next
    /// stage is externally executed.
    pub fn next_invocation(
        &self,
        commands: &ToolchainCommands,
        target: &TargetConfig,
    ) -> Option<(ToolStage, ToolInvocation)> {
        match self.stage {
            Stage::IrGenerated => Some((
                ToolStage::Assemble,
                assemble_invocation(commands, &self.ir_path, &self.assembled_path),
            )),
            Stage::Assembled => Some((
                ToolStage::Optimize,
                optimize_invocation(commands, &self.assembled_path, &self.optimized_path),
            )),
            Stage::Optimized => Some((
                ToolStage::EmitObject,
                emit_object_invocation(commands, target, &self.optimized_path, &self.object_path),
            )),
            _ => None,
        }
    }

    /// Advance on completion of the current stage
    pub fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            self.stage = next;
        }
    }

    /// Move to the terminal failure state
    pub fn fail(&mut self) {
        self.stage = Stage::Failed;
    }
}
