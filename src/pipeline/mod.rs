//! Compile-then-run orchestration over the external Patito toolchain.
//!
//! A run stages the source text to a temporary file, invokes the compiler on
//! it, optionally invokes the virtual machine on the compiled artifact, and
//! removes both temporary files whatever happened in between.

mod error;
mod staging;
mod tools;

pub use error::{BuildError, Stage, Tool};
pub use staging::{artifact_path, StagedSource, ARTIFACT_EXTENSION, SOURCE_EXTENSION};
pub use tools::{bundled_dirs, ToolLocator, ToolPaths};

use crate::output::OutputSink;
use crate::process::{ProcessResult, ProcessRunner};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Flag passed to the compiler after the source path.
pub const COMPILE_FLAG: &str = "-c";

/// Input for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub source_text: String,
    pub run_after_compile: bool,
}

impl BuildRequest {
    pub fn compile(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            run_after_compile: false,
        }
    }

    pub fn compile_and_run(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            run_after_compile: true,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug)]
pub enum BuildOutcome {
    Succeeded,
    Failed(BuildError),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded)
    }

    pub fn error(&self) -> Option<&BuildError> {
        match self {
            BuildOutcome::Succeeded => None,
            BuildOutcome::Failed(err) => Some(err),
        }
    }
}

pub struct BuildPipeline {
    runner: Arc<dyn ProcessRunner>,
    tools: Arc<dyn ToolLocator>,
    staging_dir: PathBuf,
}

impl BuildPipeline {
    pub fn new(runner: Arc<dyn ProcessRunner>, tools: Arc<dyn ToolLocator>) -> Self {
        Self {
            runner,
            tools,
            staging_dir: std::env::temp_dir(),
        }
    }

    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Run the pipeline to a terminal state, reporting progress into `sink`.
    pub fn execute(&self, request: &BuildRequest, sink: &mut dyn OutputSink) -> BuildOutcome {
        sink.clear();

        let staged = match StagedSource::create(&self.staging_dir, &request.source_text) {
            Ok(staged) => staged,
            Err(e) => return fail(sink, BuildError::Staging(e)),
        };
        debug!(source = %staged.source_path().display(), "staged source");

        let outcome = match self.compile_and_run(request, &staged, sink) {
            Ok(()) => BuildOutcome::Succeeded,
            Err(err) => fail(sink, err),
        };

        drop(staged);
        info!(success = outcome.is_success(), "build finished");
        outcome
    }

    fn compile_and_run(
        &self,
        request: &BuildRequest,
        staged: &StagedSource,
        sink: &mut dyn OutputSink,
    ) -> Result<(), BuildError> {
        let compiler = self.tools.locate(Tool::Compiler)?;
        sink.append(&format!("Compiling {}...", staged.file_name()));
        let result = self.runner.run(
            &compiler,
            &[
                staged.source_path().as_os_str().to_owned(),
                OsString::from(COMPILE_FLAG),
            ],
        );
        report(Stage::Compile, result, sink)?;
        sink.append("Compilation succeeded.");

        if !request.run_after_compile {
            return Ok(());
        }

        let vm = self.tools.locate(Tool::VirtualMachine)?;
        sink.append(&format!("Running {}...", staged.artifact_name()));
        let result = self
            .runner
            .run(&vm, &[staged.artifact_path().as_os_str().to_owned()]);
        report(Stage::Run, result, sink)?;
        sink.append("Execution finished.");

        Ok(())
    }
}

fn report(stage: Stage, result: ProcessResult, sink: &mut dyn OutputSink) -> Result<(), BuildError> {
    if result.is_launch_failure() {
        return Err(BuildError::LaunchFailure {
            tool: stage.tool(),
            message: result.combined_output,
        });
    }

    if !result.combined_output.is_empty() {
        sink.append(&result.combined_output);
    }

    if result.exit_code != 0 {
        return Err(BuildError::NonZeroExit {
            stage,
            code: result.exit_code,
        });
    }
    Ok(())
}

fn fail(sink: &mut dyn OutputSink, err: BuildError) -> BuildOutcome {
    info!(error = %err, "build failed");
    sink.append(&err.to_string());
    BuildOutcome::Failed(err)
}
