// Shared fixtures for the integration tests.
#![allow(dead_code)]

use patito_shell::pipeline::{BuildError, BuildPipeline, Tool, ToolLocator};
use patito_shell::process::{ProcessResult, ProcessRunner};
use std::collections::VecDeque;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub const COMPILER: &str = "/stub/patito-compiler";
pub const VM: &str = "/stub/patito-vm";

/// One call seen by `ScriptedRunner`.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    /// Contents of the first argument's file at the moment of the call.
    pub file_text: Option<String>,
}

impl Invocation {
    pub fn is_compiler(&self) -> bool {
        self.program == Path::new(COMPILER)
    }

    pub fn is_vm(&self) -> bool {
        self.program == Path::new(VM)
    }

    pub fn first_arg(&self) -> PathBuf {
        PathBuf::from(&self.args[0])
    }
}

/// Replays canned results and records every invocation.
///
/// A compile call (`<src> -c`) also drops an artifact next to the source,
/// the way the real compiler does.
pub struct ScriptedRunner {
    responses: Mutex<VecDeque<ProcessResult>>,
    calls: Mutex<Vec<Invocation>>,
    artifact_as_dir: bool,
}

impl ScriptedRunner {
    pub fn new(responses: Vec<ProcessResult>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            artifact_as_dir: false,
        })
    }

    /// Like `new`, but a compile call leaves a directory at the artifact
    /// path, so removing it as a file fails.
    pub fn with_directory_artifact(responses: Vec<ProcessResult>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
            artifact_as_dir: true,
        })
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn vm_calls(&self) -> usize {
        self.calls().iter().filter(|c| c.is_vm()).count()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> ProcessResult {
        let first = args.first().map(PathBuf::from);
        let file_text = first.as_ref().and_then(|p| fs::read_to_string(p).ok());

        if let (Some(src), Some(flag)) = (first.as_ref(), args.get(1)) {
            if flag == "-c" {
                let artifact = src.with_extension("patitoc");
                if self.artifact_as_dir {
                    let _ = fs::create_dir(&artifact);
                } else {
                    let _ = fs::write(&artifact, b"artifact");
                }
            }
        }

        self.calls.lock().unwrap().push(Invocation {
            program: program.to_path_buf(),
            args: args.to_vec(),
            file_text,
        });

        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ProcessResult::new("", 0))
    }
}

/// Hands out fixed tool paths without touching the filesystem.
pub struct FixedTools {
    pub compiler: bool,
    pub vm: bool,
}

impl FixedTools {
    pub fn both() -> Arc<Self> {
        Arc::new(Self {
            compiler: true,
            vm: true,
        })
    }
}

impl ToolLocator for FixedTools {
    fn locate(&self, tool: Tool) -> Result<PathBuf, BuildError> {
        let (found, path) = match tool {
            Tool::Compiler => (self.compiler, COMPILER),
            Tool::VirtualMachine => (self.vm, VM),
        };
        if found {
            Ok(PathBuf::from(path))
        } else {
            Err(BuildError::ToolNotFound {
                tool,
                detail: "not installed".to_string(),
            })
        }
    }
}

pub fn pipeline_in(dir: &Path, runner: Arc<ScriptedRunner>, tools: Arc<FixedTools>) -> BuildPipeline {
    BuildPipeline::new(runner, tools).with_staging_dir(dir)
}

pub fn dir_is_empty(dir: &Path) -> bool {
    fs::read_dir(dir).unwrap().next().is_none()
}

/// Cloneable in-memory writer for front ends that consume their output sink.
#[derive(Clone, Default)]
pub struct SharedBuf(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
