use super::{ProcessResult, ProcessRunner, LAUNCH_FAILURE_CODE};
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use tracing::{debug, warn};

/// Runs tools as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString]) -> ProcessResult {
        debug!(program = %program.display(), ?args, "spawning");

        let mut child = match Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => {
                warn!(program = %program.display(), error = %e, "spawn failed");
                return ProcessResult::launch_failure(e.to_string());
            }
        };

        // Both pipes are drained on their own threads so a chatty stderr
        // cannot stall the child while we block on stdout.
        let stdout_thread = child.stdout.take().map(|mut out| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buf = Vec::new();
                out.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });
        let stderr_thread = child.stderr.take().map(|mut err| {
            thread::spawn(move || -> io::Result<Vec<u8>> {
                let mut buf = Vec::new();
                err.read_to_end(&mut buf)?;
                Ok(buf)
            })
        });

        let status = child.wait();

        let stdout = collect(stdout_thread);
        let stderr = collect(stderr_thread);

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                warn!(program = %program.display(), error = %e, "wait failed");
                return wait_failure(&e);
            }
        };

        let code = exit_code(status);
        debug!(program = %program.display(), code, "process exited");

        ProcessResult::from_streams(
            &String::from_utf8_lossy(&stdout),
            &String::from_utf8_lossy(&stderr),
            code,
        )
    }
}

/// The child started but its exit status could not be read.
fn wait_failure(err: &io::Error) -> ProcessResult {
    ProcessResult::new(
        format!("lost track of the process: {}", err),
        LAUNCH_FAILURE_CODE,
    )
}

fn collect(reader: Option<thread::JoinHandle<io::Result<Vec<u8>>>>) -> Vec<u8> {
    match reader.map(|handle| handle.join()) {
        Some(Ok(Ok(bytes))) => bytes,
        Some(Ok(Err(e))) => {
            warn!(error = %e, "failed to read child output");
            Vec::new()
        }
        Some(Err(_)) => {
            warn!("output reader thread panicked");
            Vec::new()
        }
        None => Vec::new(),
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
