//! Subprocess execution with a hard timeout.
//!
//! stdout/stderr are drained on helper threads while the child runs. Without
//! that, a child writing more than the pipe buffer (~64KB, easily reached by
//! a paginated `--all` listing) blocks on write and we deadlock waiting.
//!
//! On unix the child leads its own process group, so a timeout kills any
//! wrapper script together with the processes it started.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{CloudError, Result};

/// Poll interval while waiting for the child.
pub const WAIT_POLL_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// One external command invocation.
#[derive(Debug, Clone)]
pub struct Invocation<'a> {
    pub program: &'a Path,
    pub args: &'a [String],
    pub envs: &'a [(String, String)],
    pub timeout: Duration,
    /// Short name used in errors and logs, e.g. `network vcn list`.
    pub operation: &'a str,
}

/// Runs commands for the CLI backend; swapped for canned output in tests.
pub trait CommandRunner {
    fn run(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput> {
        let mut command = Command::new(invocation.program);
        command
            .args(invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (k, v) in invocation.envs {
            command.env(k, v);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let started = Instant::now();
        let mut child = command.spawn().map_err(|e| {
            CloudError::ClientUnavailable(format!(
                "failed to start {}: {}",
                invocation.program.display(),
                e
            ))
        })?;

        let output = wait_with_timeout(&mut child, invocation.timeout, invocation.operation);
        tracing::debug!(
            operation = invocation.operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = output.as_ref().map(|o| o.success()).unwrap_or(false),
            "oci call finished"
        );
        output
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<io::Result<Vec<u8>>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Collect a drained pipe. A read failure or non-UTF-8 output is an upstream
/// error, never empty output.
fn collect(handle: Option<JoinHandle<io::Result<Vec<u8>>>>, stream: &str, operation: &str) -> Result<String> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .join()
        .map_err(|_| CloudError::UnexpectedUpstream(format!("{}: {} reader panicked", operation, stream)))?
        .map_err(|e| CloudError::UnexpectedUpstream(format!("{}: failed to read {}: {}", operation, stream, e)))?;
    String::from_utf8(bytes)
        .map_err(|e| CloudError::UnexpectedUpstream(format!("{}: {} is not valid UTF-8: {}", operation, stream, e)))
}

/// Kill the child and, on unix, the rest of its process group.
fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;
        if let Ok(pid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}

/// Wait for `child`, killing it once `timeout` elapses.
pub fn wait_with_timeout(child: &mut Child, timeout: Duration, operation: &str) -> Result<ProcessOutput> {
    let start = Instant::now();
    let check_interval = Duration::from_millis(WAIT_POLL_INTERVAL_MS);

    let stdout_handle = child.stdout.take().map(drain);
    let stderr_handle = child.stderr.take().map(drain);

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = collect(stdout_handle, "stdout", operation)?;
                // stderr only feeds error classification; keep what decodes.
                let stderr = match collect(stderr_handle, "stderr", operation) {
                    Ok(s) => s,
                    Err(e) => e.to_string(),
                };
                return Ok(ProcessOutput {
                    stdout,
                    stderr,
                    exit_code: status.code().unwrap_or(-1),
                });
            }
            Ok(None) => {}
            Err(e) => {
                kill_tree(child);
                return Err(CloudError::TransientIo(format!(
                    "failed to wait for '{}': {}",
                    operation, e
                )));
            }
        }

        if start.elapsed() > timeout {
            // Drain threads are left detached: a process that escaped the
            // group may still hold the pipes open.
            kill_tree(child);
            tracing::warn!(operation, timeout_secs = timeout.as_secs(), "oci call timed out; child killed");
            return Err(CloudError::Timeout {
                operation: operation.to_string(),
                after: timeout,
            });
        }

        thread::sleep(check_interval);
    }
}
