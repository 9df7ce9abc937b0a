//! Subprocess execution and lifecycle management.

use crate::error::CommandError;
use crate::types::{CommandConfig, RunResult};
use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;

/// Per-stream capture limit.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024; // 10 MiB
const GRACE_PERIOD: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamKind {
    Stdout,
    Stderr,
}

/// Collected output lines, total byte count, and whether truncation occurred.
type StreamOutput = (StreamKind, Vec<String>, usize, bool);

/// Stdout lines, stderr lines and exit status.
type CollectedOutput = (Vec<String>, Vec<String>, std::process::ExitStatus);

/// Spawns `path`, feeds it `stdin`, and collects its output.
///
/// The child is killed if the returned future is dropped, so cancelling the
/// caller stops the process.
///
/// # Errors
/// Returns a [`CommandError`] if the process cannot be spawned, times out,
/// produces more than [`MAX_OUTPUT_BYTES`] on a stream, or hits an I/O failure.
/// A non-zero exit is not an error here; see [`RunResult::into_success`].
pub async fn run_command(
    path: &Path,
    args: &[OsString],
    stdin: Option<&str>,
    config: &CommandConfig,
) -> Result<RunResult, CommandError> {
    let start_time = Instant::now();
    let mut child = spawn_child(path, args, stdin.is_some(), config)?;
    tracing::debug!(program = %path.display(), args = args.len(), "spawned command");

    let writer = stdin.map(|input| {
        let input = input.to_string();
        let pipe = child.stdin.take();
        tokio::spawn(async move { feed_stdin(pipe, input).await })
    });

    let stdout = child.stdout.take().ok_or(CommandError::NoStdout)?;
    let stderr = child.stderr.take().ok_or(CommandError::NoStderr)?;
    let pid = child.id().ok_or(CommandError::NoPid)?;

    let mut tasks = JoinSet::new();
    tasks.spawn(async move { drain_stream_bounded(stdout, StreamKind::Stdout).await });
    tasks.spawn(async move { drain_stream_bounded(stderr, StreamKind::Stderr).await });

    let outcome = timeout(config.timeout, collect_output(&mut child, &mut tasks)).await;
    let duration = start_time.elapsed();

    let (stdout_lines, stderr_lines, status) = match outcome {
        Ok(collected) => collected?,
        Err(_) => {
            tracing::warn!(pid, timeout = ?config.timeout, "command timed out, shutting down");
            if let Err(e) = graceful_shutdown(&mut child, pid, &mut tasks).await {
                tracing::warn!(pid, error = %e, "shutdown after timeout failed");
            }
            return Err(CommandError::Timeout {
                elapsed: duration,
                pid,
            });
        }
    };

    if let Some(writer) = writer {
        finish_stdin(writer).await?;
    }

    Ok(RunResult {
        stdout: stdout_lines.join("\n"),
        stderr: stderr_lines.join("\n"),
        exit_code: status.code().unwrap_or(-1),
        duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
    })
}

fn spawn_child(
    path: &Path,
    args: &[OsString],
    pipe_stdin: bool,
    config: &CommandConfig,
) -> Result<Child, CommandError> {
    let mut cmd = Command::new(path);
    cmd.args(args)
        .stdin(if pipe_stdin { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(ref dir) = config.cwd {
        cmd.current_dir(dir);
    }

    for (k, v) in &config.env_vars {
        cmd.env(k, v);
    }

    cmd.spawn().map_err(|e| CommandError::SpawnFailed {
        stage: "spawn".to_string(),
        source: e,
    })
}

async fn feed_stdin(pipe: Option<tokio::process::ChildStdin>, input: String) -> std::io::Result<()> {
    let Some(mut pipe) = pipe else {
        return Ok(());
    };
    pipe.write_all(input.as_bytes()).await?;
    pipe.shutdown().await
}

/// A child that exits without reading its input is not a failure.
async fn finish_stdin(writer: JoinHandle<std::io::Result<()>>) -> Result<(), CommandError> {
    match writer.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
            tracing::debug!("command closed stdin before reading all input");
            Ok(())
        }
        Ok(Err(e)) => Err(CommandError::StdinFailed(e)),
        Err(e) => Err(CommandError::StreamFailed {
            stage: "stdin".to_string(),
            source: e,
        }),
    }
}

async fn collect_output(
    child: &mut Child,
    tasks: &mut JoinSet<StreamOutput>,
) -> Result<CollectedOutput, CommandError> {
    let mut stdout_lines = Vec::new();
    let mut stderr_lines = Vec::new();

    while let Some(result) = tasks.join_next().await {
        let (kind, lines, bytes, truncated) = result.map_err(|e| CommandError::StreamFailed {
            stage: "join".to_string(),
            source: e,
        })?;

        if truncated {
            return Err(CommandError::OutputTruncated {
                captured_bytes: bytes,
                limit_bytes: MAX_OUTPUT_BYTES,
            });
        }

        match kind {
            StreamKind::Stdout => stdout_lines = lines,
            StreamKind::Stderr => stderr_lines = lines,
        }
    }

    let status = child.wait().await.map_err(|e| CommandError::SpawnFailed {
        stage: "wait".to_string(),
        source: e,
    })?;

    Ok((stdout_lines, stderr_lines, status))
}

async fn drain_stream_bounded(
    stream: impl tokio::io::AsyncRead + Unpin,
    kind: StreamKind,
) -> StreamOutput {
    let mut reader = BufReader::new(stream).lines();
    let mut lines = Vec::new();
    let mut total_bytes = 0usize;
    let mut truncated = false;

    while let Ok(Some(line)) = reader.next_line().await {
        let line_bytes = line.len();
        if total_bytes + line_bytes <= MAX_OUTPUT_BYTES {
            lines.push(line);
            total_bytes += line_bytes;
        } else {
            truncated = true;
        }
    }

    (kind, lines, total_bytes, truncated)
}

/// `SIGTERM`, wait out the grace period, then `SIGKILL`.
#[cfg(unix)]
async fn graceful_shutdown(
    child: &mut Child,
    pid: u32,
    tasks: &mut JoinSet<StreamOutput>,
) -> Result<(), CommandError> {
    use nix::sys::signal::{self, Signal};
    use nix::unistd::Pid;

    let raw_pid = i32::try_from(pid).map_err(|_| CommandError::SignalFailed {
        signal: "SIGTERM".to_string(),
        pid,
        reason: "PID value exceeds i32::MAX".to_string(),
    })?;

    signal::kill(Pid::from_raw(raw_pid), Signal::SIGTERM).map_err(|e| {
        CommandError::SignalFailed {
            signal: "SIGTERM".to_string(),
            pid,
            reason: e.to_string(),
        }
    })?;

    match timeout(GRACE_PERIOD, child.wait()).await {
        Ok(Ok(_status)) => {}
        Ok(Err(e)) => {
            return Err(CommandError::SpawnFailed {
                stage: "graceful shutdown wait".to_string(),
                source: e,
            });
        }
        Err(_) => {
            child.kill().await.map_err(|e| CommandError::SpawnFailed {
                stage: "SIGKILL".to_string(),
                source: e,
            })?;
        }
    }

    tasks.abort_all();
    Ok(())
}

#[cfg(windows)]
async fn graceful_shutdown(
    child: &mut Child,
    _pid: u32,
    tasks: &mut JoinSet<StreamOutput>,
) -> Result<(), CommandError> {
    child.kill().await.map_err(|e| CommandError::SpawnFailed {
        stage: "TerminateProcess".to_string(),
        source: e,
    })?;
    tasks.abort_all();
    Ok(())
}
