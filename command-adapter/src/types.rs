//! Invocation settings and results.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CommandError;

/// Default deadline for one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// How a command is run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Working directory for the child.
    pub cwd: Option<PathBuf>,
    /// Extra environment variables.
    pub env_vars: Vec<(String, String)>,
    /// Deadline after which the child is shut down.
    pub timeout: Duration,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            env_vars: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Values substituted into `{prompt}`, `{temperature}`, `{model}`, `{source}` and `{mode}`.
///
/// A missing value substitutes as the empty string.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateVars<'a> {
    /// Prompt text.
    pub prompt: Option<&'a str>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Model name.
    pub model: Option<&'a str>,
    /// Name of the text being processed.
    pub source: Option<&'a str>,
    /// Validation depth, e.g. `syntax` or `semantic`.
    pub mode: Option<&'a str>,
}

/// Captured outcome of a finished child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Stdout, lines joined with `\n`.
    pub stdout: String,
    /// Stderr, lines joined with `\n`.
    pub stderr: String,
    /// Exit code, or -1 when killed by a signal.
    pub exit_code: i32,
    /// Wall time.
    pub duration_ms: u64,
}

impl RunResult {
    /// Whether the child exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turns a non-zero exit into [`CommandError::NonZeroExit`].
    ///
    /// # Errors
    /// Returns `NonZeroExit` carrying the captured output when the exit code is not zero.
    pub fn into_success(self) -> Result<Self, CommandError> {
        if self.success() {
            Ok(self)
        } else {
            Err(CommandError::NonZeroExit {
                exit_code: self.exit_code,
                stdout: self.stdout,
                stderr: self.stderr,
            })
        }
    }
}
