use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Grace period between SIGTERM and SIGKILL when stopping a tool.
const KILL_GRACE: Duration = Duration::from_millis(200);

/// Configuration for spawning a tool process.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub timeout: Option<Duration>,
    pub log_prefix: String,
    /// Flipped to `true` when the watch loop is shutting down.
    pub shutdown: Option<watch::Receiver<bool>>,
}

/// Output from a completed tool process.
#[derive(Debug)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub signal: Option<i32>,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0 && self.signal.is_none()
    }

    pub fn stdout(&self) -> String {
        self.stdout_lines.join("\n")
    }

    /// Stderr with blank lines removed; empty when the tool wrote nothing useful.
    pub fn stderr(&self) -> String {
        self.stderr_lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

enum Ending {
    Exited(std::process::ExitStatus),
    TimedOut(Duration),
    Shutdown,
}

/// Run a tool to completion and collect its output.
///
/// The child gets its own process group so that stopping it also stops
/// anything it spawned. The group is terminated when the timeout elapses or
/// when `shutdown` fires; signals sent to lintblame itself are handled by
/// the watch loop, never here.
pub async fn spawn_and_collect(config: ProcessConfig) -> Result<ProcessOutput> {
    let mut cmd = Command::new(&config.command);
    cmd.args(&config.args)
        .current_dir(&config.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = cmd
        .spawn()
        .map_err(|e| Error::Process(format!("failed to spawn '{}': {e}", config.command)))?;

    let pid = child
        .id()
        .ok_or_else(|| Error::Process("child has no pid".into()))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Process("stdout not captured".into()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Process("stderr not captured".into()))?;

    let stdout_task = collect_lines(stdout, config.log_prefix.clone(), "stdout");
    let stderr_task = collect_lines(stderr, config.log_prefix.clone(), "stderr");

    let ending = {
        let wait = child.wait();
        tokio::pin!(wait);
        let deadline = async {
            match config.timeout {
                Some(dur) => {
                    tokio::time::sleep(dur).await;
                    dur
                }
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            status = &mut wait => {
                Ending::Exited(status.map_err(|e| Error::Process(format!("wait error: {e}")))?)
            }
            dur = deadline => Ending::TimedOut(dur),
            _ = wait_for_shutdown(config.shutdown.clone()) => Ending::Shutdown,
        }
    };

    let status = match ending {
        Ending::Exited(status) => status,
        Ending::TimedOut(dur) => {
            terminate_group(pid).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(Error::Process(format!(
                "'{}' timed out after {dur:?}",
                config.command
            )));
        }
        Ending::Shutdown => {
            debug!(command = %config.log_prefix, "stopping tool for shutdown");
            terminate_group(pid).await;
            stdout_task.abort();
            stderr_task.abort();
            return Err(Error::Interrupted);
        }
    };

    let stdout_lines = stdout_task
        .await
        .map_err(|e| Error::Process(format!("stdout reader failed: {e}")))?;
    let stderr_lines = stderr_task
        .await
        .map_err(|e| Error::Process(format!("stderr reader failed: {e}")))?;

    let (exit_code, signal) = extract_exit_info(&status);
    debug!(
        command = %config.log_prefix,
        exit_code,
        stdout_lines = stdout_lines.len(),
        "tool finished"
    );

    Ok(ProcessOutput {
        exit_code,
        signal,
        stdout_lines,
        stderr_lines,
    })
}

/// Read a stream to the end, one lossily-decoded line at a time.
fn collect_lines<R>(stream: R, prefix: String, name: &'static str) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = Vec::new();
        let mut reader = BufReader::new(stream).split(b'\n');
        loop {
            match reader.next_segment().await {
                Ok(Some(bytes)) => {
                    let line = decode_line(&bytes);
                    trace!("[{prefix}] {name}: {line}");
                    lines.push(line);
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(command = %prefix, stream = name, error = %e, "read failed");
                    break;
                }
            }
        }
        lines
    })
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

async fn wait_for_shutdown(shutdown: Option<watch::Receiver<bool>>) {
    let Some(mut rx) = shutdown else {
        return std::future::pending().await;
    };
    // A dropped sender means nobody can ask for shutdown anymore
    let stopped = rx.wait_for(|stop| *stop).await.is_ok();
    if !stopped {
        std::future::pending::<()>().await;
    }
}

/// SIGTERM the tool's process group, then SIGKILL whatever is left.
async fn terminate_group(pid: u32) {
    #[cfg(unix)]
    unsafe {
        libc::killpg(pid as i32, libc::SIGTERM);
    }
    tokio::time::sleep(KILL_GRACE).await;
    #[cfg(unix)]
    unsafe {
        libc::killpg(pid as i32, libc::SIGKILL);
    }
    #[cfg(not(unix))]
    let _ = pid;
}

fn extract_exit_info(status: &std::process::ExitStatus) -> (i32, Option<i32>) {
    if let Some(code) = status.code() {
        return (code, None);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return (128 + sig, Some(sig));
        }
    }
    (-1, None)
}
