//! Runs external programs as model providers or query validators.
//!
//! A command is a program plus an argument template. Placeholders in the
//! template are filled per call (see [`cmd`]); input that is not passed inline
//! is written to the child's stdin.

pub mod cmd;
pub mod discovery;
pub mod error;
pub mod process;
pub mod types;

use std::path::PathBuf;

pub use cmd::{build_args, split_command_line, takes_prompt_inline};
pub use discovery::{discover_program, AGENT_BIN_ENV_VAR};
pub use error::CommandError;
pub use process::run_command;
pub use types::{CommandConfig, RunResult, TemplateVars, DEFAULT_TIMEOUT};

/// A resolved program with its argument template.
#[derive(Debug, Clone)]
pub struct ExternalCommand {
    /// Resolved executable.
    pub path: PathBuf,
    /// Arguments, possibly containing placeholders.
    pub template: Vec<String>,
    /// Execution settings.
    pub config: CommandConfig,
}

impl ExternalCommand {
    /// Creates a command from an already-resolved path.
    #[must_use]
    pub fn new(path: PathBuf, template: Vec<String>) -> Self {
        Self {
            path,
            template,
            config: CommandConfig::default(),
        }
    }

    /// Sets execution settings.
    #[must_use]
    pub fn with_config(mut self, config: CommandConfig) -> Self {
        self.config = config;
        self
    }

    /// Whether the template consumes `{prompt}` itself.
    #[must_use]
    pub fn takes_prompt_inline(&self) -> bool {
        takes_prompt_inline(&self.template)
    }

    /// Fills the template and runs the program once.
    ///
    /// # Errors
    /// Propagates [`run_command`] failures. The exit code is not checked.
    pub async fn run(&self, vars: &TemplateVars<'_>, stdin: Option<&str>) -> Result<RunResult, CommandError> {
        let args = build_args(&self.template, vars);
        run_command(&self.path, &args, stdin, &self.config).await
    }
}
