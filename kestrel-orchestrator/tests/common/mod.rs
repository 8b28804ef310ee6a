//! Shared test doubles for the build-session tests

use kestrel_config::TargetConfig;
use kestrel_core::ast::Program;
use kestrel_core::module::ExportTable;
use kestrel_core::parse::{Parser, SyntaxError};
use kestrel_orchestrator::{
    CodeGenError, CodeGenerator, IrUnit, ToolHandle, ToolInvocation, ToolRunner, ToolStatus,
};
use std::collections::HashMap;
use std::path::Path;

/// Install a log subscriber for tests run with RUST_LOG set. Safe to call
/// from every test; only the first call wins.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parser scripted per file path
pub struct FakeParser {
    programs: HashMap<String, Program>,
}

impl FakeParser {
    pub fn new(programs: Vec<(&str, Program)>) -> Self {
        Self {
            programs: programs
                .into_iter()
                .map(|(p, t)| (p.to_string(), t))
                .collect(),
        }
    }
}

impl Parser for FakeParser {
    fn parse(&self, file: &Path, _source: &str) -> Result<Program, SyntaxError> {
        self.programs
            .get(&file.display().to_string())
            .cloned()
            .ok_or_else(|| SyntaxError::new(file, 1, 1, "unexpected token"))
    }
}

pub struct FakeIrUnit {
    symbol: String,
    text: String,
}

impl IrUnit for FakeIrUnit {
    fn entry_symbol(&self) -> &str {
        &self.symbol
    }

    fn serialize(&self) -> Vec<u8> {
        self.text.clone().into_bytes()
    }
}

/// Code generator producing placeholder IR; optionally fails for one
/// module base name.
#[derive(Default)]
pub struct FakeCodeGenerator {
    pub fail_for_stem: Option<String>,
}

impl CodeGenerator for FakeCodeGenerator {
    fn generate(
        &self,
        _ast: Program,
        base_name: &str,
        _exports: &ExportTable,
        _target: &TargetConfig,
    ) -> Result<Box<dyn IrUnit>, CodeGenError> {
        if let Some(stem) = &self.fail_for_stem {
            if base_name.starts_with(stem.as_str()) {
                return Err(CodeGenError::new(format!("cannot lower '{base_name}'")));
            }
        }
        let symbol = format!("_kst_toplevel_{}", base_name.replace(['-', '.', '/'], "_"));
        Ok(Box::new(FakeIrUnit {
            symbol,
            text: format!("; module {base_name}\n"),
        }))
    }
}

/// Records every invocation; failures are scripted per program name.
#[derive(Default)]
pub struct RecordingToolRunner {
    pub invocations: Vec<ToolInvocation>,
    /// Program that exits with a non-zero code
    pub fail_program: Option<String>,
    pub fail_code: i32,
    /// Program whose spawn/run errors at the OS level
    pub unspawnable_program: Option<String>,
    pub run_calls: usize,
    pub spawn_calls: usize,
}

impl RecordingToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(program: &str, code: i32) -> Self {
        Self {
            fail_program: Some(program.to_string()),
            fail_code: code,
            ..Self::default()
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.invocations.iter().map(|i| i.program.clone()).collect()
    }

    fn status_for(&self, invocation: &ToolInvocation) -> std::io::Result<ToolStatus> {
        if self.unspawnable_program.as_deref() == Some(invocation.program.as_str()) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no such program",
            ));
        }
        if self.fail_program.as_deref() == Some(invocation.program.as_str()) {
            return Ok(ToolStatus::Exited(self.fail_code));
        }
        Ok(ToolStatus::Exited(0))
    }
}

impl ToolRunner for RecordingToolRunner {
    fn run(&mut self, invocation: &ToolInvocation) -> std::io::Result<ToolStatus> {
        self.run_calls += 1;
        self.invocations.push(invocation.clone());
        self.status_for(invocation)
    }

    fn spawn(&mut self, invocation: &ToolInvocation) -> std::io::Result<Box<dyn ToolHandle>> {
        self.spawn_calls += 1;
        self.invocations.push(invocation.clone());
        let status = self.status_for(invocation)?;
        Ok(Box::new(CountdownHandle {
            polls_until_done: 2,
            status,
        }))
    }
}

/// Reports `Running` a couple of times before completing, so the polling
/// driver actually polls.
pub struct CountdownHandle {
    polls_until_done: u32,
    status: ToolStatus,
}

impl ToolHandle for CountdownHandle {
    fn poll(&mut self) -> std::io::Result<ToolStatus> {
        if self.polls_until_done > 0 {
            self.polls_until_done -= 1;
            Ok(ToolStatus::Running)
        } else {
            Ok(self.status)
        }
    }
}
