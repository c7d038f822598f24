use crate::buffer::{BufferError, Edit, SourceBuffer};
use crate::output::OutputLog;
use crate::pipeline::{BuildOutcome, BuildRequest};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Sequence number of a build run within one shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildId(pub u64);

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Every mutation of the shell goes through one of these.
#[derive(Debug)]
pub enum ShellEvent {
    NewFile,
    LoadFile(PathBuf),
    Save,
    SaveAs(PathBuf),
    Edit(Edit),
    StartBuild { run_after_compile: bool },
    ClearOutput { build: BuildId },
    AppendOutput { build: BuildId, text: String },
    BuildFinished { build: BuildId, outcome: BuildOutcome },
}

/// What an applied event changed.
#[derive(Debug, PartialEq, Eq)]
pub enum Reaction {
    BufferChanged,
    Saved(PathBuf),
    BuildStarted { build: BuildId, request: BuildRequest },
    OutputCleared { build: BuildId },
    OutputAppended { build: BuildId, lines: Vec<String> },
    BuildFinished { build: BuildId, summary: BuildSummary },
    /// The event belonged to a build that is no longer current.
    Ignored,
}

/// Final status line of a finished build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub success: bool,
    pub message: String,
}

impl BuildSummary {
    fn from_outcome(outcome: &BuildOutcome) -> Self {
        match outcome {
            BuildOutcome::Succeeded => Self {
                success: true,
                message: "Build succeeded.".to_string(),
            },
            BuildOutcome::Failed(err) => Self {
                success: false,
                message: err.to_string(),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ShellError {
    #[error("build {0} is still running")]
    BuildInProgress(BuildId),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Buffer, output log and build bookkeeping owned by one front end.
#[derive(Debug, Default)]
pub struct ShellState {
    buffer: SourceBuffer,
    output: OutputLog,
    next_build: u64,
    in_flight: Option<BuildId>,
    last_build: Option<(BuildId, BuildSummary)>,
}

impl ShellState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &SourceBuffer {
        &self.buffer
    }

    pub fn output(&self) -> &OutputLog {
        &self.output
    }

    pub fn build_in_flight(&self) -> Option<BuildId> {
        self.in_flight
    }

    pub fn last_build(&self) -> Option<&(BuildId, BuildSummary)> {
        self.last_build.as_ref()
    }

    pub fn apply(&mut self, event: ShellEvent) -> Result<Reaction, ShellError> {
        match event {
            ShellEvent::NewFile => {
                self.buffer.clear();
                Ok(Reaction::BufferChanged)
            }
            ShellEvent::LoadFile(path) => {
                self.buffer.load(&path)?;
                Ok(Reaction::BufferChanged)
            }
            ShellEvent::Save => Ok(Reaction::Saved(self.buffer.save()?)),
            ShellEvent::SaveAs(path) => Ok(Reaction::Saved(self.buffer.save_as(path)?)),
            ShellEvent::Edit(edit) => {
                self.buffer.apply(edit)?;
                Ok(Reaction::BufferChanged)
            }
            ShellEvent::StartBuild { run_after_compile } => {
                if let Some(build) = self.in_flight {
                    return Err(ShellError::BuildInProgress(build));
                }
                self.next_build += 1;
                let build = BuildId(self.next_build);
                self.in_flight = Some(build);
                self.output.clear();
                info!(%build, run_after_compile, "build accepted");

                let request = BuildRequest {
                    source_text: self.buffer.text().to_string(),
                    run_after_compile,
                };
                Ok(Reaction::BuildStarted { build, request })
            }
            ShellEvent::ClearOutput { build } => {
                if !self.is_current(build) {
                    return Ok(Reaction::Ignored);
                }
                self.output.clear();
                Ok(Reaction::OutputCleared { build })
            }
            ShellEvent::AppendOutput { build, text } => {
                if !self.is_current(build) {
                    debug!(%build, "dropping output from stale build");
                    return Ok(Reaction::Ignored);
                }
                let before = self.output.len();
                self.output.append(&text);
                let lines = self.output.lines()[before..].to_vec();
                Ok(Reaction::OutputAppended { build, lines })
            }
            ShellEvent::BuildFinished { build, outcome } => {
                if !self.is_current(build) {
                    return Ok(Reaction::Ignored);
                }
                self.in_flight = None;
                let summary = BuildSummary::from_outcome(&outcome);
                self.last_build = Some((build, summary.clone()));
                Ok(Reaction::BuildFinished { build, summary })
            }
        }
    }

    fn is_current(&self, build: BuildId) -> bool {
        self.in_flight == Some(build)
    }
}
