mod system;

use std::ffi::OsString;
use std::path::Path;

pub use system::SystemRunner;

/// Exit code reported when the executable could not be started at all.
pub const LAUNCH_FAILURE_CODE: i32 = -1;

/// Launches one external executable and waits for it.
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with a discrete argument list (no shell involved).
    fn run(&self, program: &Path, args: &[OsString]) -> ProcessResult;
}

/// Captured output and exit status of a single invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub combined_output: String,
    pub exit_code: i32,
    launch_failed: bool,
}

impl ProcessResult {
    pub fn new(combined_output: impl Into<String>, exit_code: i32) -> Self {
        Self {
            combined_output: combined_output.into(),
            exit_code,
            launch_failed: false,
        }
    }

    /// Synthetic result for a process that never started.
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            combined_output: message.into(),
            exit_code: LAUNCH_FAILURE_CODE,
            launch_failed: true,
        }
    }

    /// Build a result from the two captured streams.
    ///
    /// stdout comes first; stderr follows after a single newline when both
    /// streams produced something. One trailing line break of stdout serves
    /// as that newline; any blank lines before it are kept.
    pub fn from_streams(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        let combined_output = if stderr.is_empty() {
            stdout.to_string()
        } else if stdout.is_empty() {
            stderr.to_string()
        } else {
            let stdout = stdout
                .strip_suffix('\n')
                .map(|s| s.strip_suffix('\r').unwrap_or(s))
                .unwrap_or(stdout);
            format!("{}\n{}", stdout, stderr)
        };
        Self::new(combined_output, exit_code)
    }

    pub fn success(&self) -> bool {
        !self.launch_failed && self.exit_code == 0
    }

    pub fn is_launch_failure(&self) -> bool {
        self.launch_failed
    }
}
