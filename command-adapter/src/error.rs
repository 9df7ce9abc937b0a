//! Error types for command execution.

use thiserror::Error;

/// Failures while locating or running an external command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// No executable could be resolved.
    #[error("executable not found: {0}")]
    ExecutableNotFound(String),

    /// An OS-level operation on the child failed.
    #[error("process {stage} failed: {source}")]
    SpawnFailed {
        /// Lifecycle stage, e.g. `spawn` or `wait`.
        stage: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Writing the input to the child failed.
    #[error("writing stdin failed: {0}")]
    StdinFailed(#[source] std::io::Error),

    /// The child's stdout pipe was not available.
    #[error("child stdout was not captured")]
    NoStdout,

    /// The child's stderr pipe was not available.
    #[error("child stderr was not captured")]
    NoStderr,

    /// The child exited before its pid could be read.
    #[error("child pid unavailable")]
    NoPid,

    /// An output reader task panicked or was cancelled.
    #[error("output reader {stage} failed: {source}")]
    StreamFailed {
        /// Reader stage.
        stage: String,
        /// Join error from the reader task.
        #[source]
        source: tokio::task::JoinError,
    },

    /// Output exceeded the capture limit.
    #[error("output truncated: captured {captured_bytes} bytes, limit {limit_bytes}")]
    OutputTruncated {
        /// Bytes kept before the limit was hit.
        captured_bytes: usize,
        /// The limit.
        limit_bytes: usize,
    },

    /// The child ran past its deadline and was shut down.
    #[error("process {pid} timed out after {elapsed:?}")]
    Timeout {
        /// Time elapsed when the deadline hit.
        elapsed: std::time::Duration,
        /// Pid of the terminated child.
        pid: u32,
    },

    /// Sending a signal to the child failed.
    #[error("failed to send {signal} to {pid}: {reason}")]
    SignalFailed {
        /// Signal name.
        signal: String,
        /// Target pid.
        pid: u32,
        /// OS error text.
        reason: String,
    },

    /// The child exited unsuccessfully.
    #[error("process exited with status {exit_code}\nSTDOUT: {stdout}\nSTDERR: {stderr}")]
    NonZeroExit {
        /// Exit code, or -1 when killed by a signal.
        exit_code: i32,
        /// Captured stdout.
        stdout: String,
        /// Captured stderr.
        stderr: String,
    },

    /// A command template could not be used.
    #[error("invalid command template: {0}")]
    InvalidTemplate(String),
}
