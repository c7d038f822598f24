use std::fmt;
use std::io;

/// One of the two external tools the pipeline drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Compiler,
    VirtualMachine,
}

impl Tool {
    pub fn file_name(self) -> String {
        let stem = match self {
            Tool::Compiler => "patito-compiler",
            Tool::VirtualMachine => "patito-vm",
        };
        format!("{}{}", stem, std::env::consts::EXE_SUFFIX)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Compiler => f.write_str("compiler"),
            Tool::VirtualMachine => f.write_str("virtual machine"),
        }
    }
}

/// Pipeline stage that launched a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Compile,
    Run,
}

impl Stage {
    pub fn tool(self) -> Tool {
        match self {
            Stage::Compile => Tool::Compiler,
            Stage::Run => Tool::VirtualMachine,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => f.write_str("Compilation"),
            Stage::Run => f.write_str("Execution"),
        }
    }
}

/// Why a build run ended in the failed state.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Tool not found: {tool} ({detail})")]
    ToolNotFound { tool: Tool, detail: String },

    #[error("Could not launch {tool}: {message}")]
    LaunchFailure { tool: Tool, message: String },

    #[error("{stage} failed (exit code {code})")]
    NonZeroExit { stage: Stage, code: i32 },

    #[error("Could not stage source file: {0}")]
    Staging(#[source] io::Error),
}

impl BuildError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }
}
