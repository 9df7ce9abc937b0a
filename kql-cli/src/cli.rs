//! Command-line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use kql_ai::generation::Preset;
use kql_ai::prompt::SuggestFocus;
use kql_ai::ValidationMode;
use serde::{Deserialize, Serialize};

/// AI-assisted Kusto Query Language toolkit.
#[derive(Debug, Parser)]
#[command(name = "kql", author, version, about, long_about = None)]
pub struct Cli {
    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// What to do.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options accepted anywhere on the command line.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Show progress for each attempt on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Show raw model responses on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    /// Settings file (default: ~/.kql/config.yaml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// External validator command; reads the query on stdin, prints one diagnostic per line
    #[arg(long, global = true, value_name = "COMMAND")]
    pub validator_command: Option<String>,

    /// Deadline in seconds for the whole command
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate KQL from a natural language description
    Generate(GenerateArgs),
    /// Repair a KQL query that has syntax errors
    Fix(FixArgs),
    /// Explain what a KQL query does
    Explain(ExplainArgs),
    /// Suggest improvements to a KQL query
    Suggest(SuggestArgs),
    /// Validate KQL files
    Lint(LintArgs),
    /// Print the effective settings
    Config(ConfigArgs),
}

/// Where the text to work on comes from.
#[derive(Debug, Clone, Default, Args)]
pub struct InputArgs {
    /// Text to work on; joined with spaces
    #[arg(value_name = "TEXT")]
    pub text: Vec<String>,

    /// Read the text from a file
    #[arg(short, long, value_name = "FILE")]
    pub file: Option<PathBuf>,
}

/// Model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Ollama `/api/chat`
    #[default]
    Ollama,
    /// OpenAI-compatible `/v1/chat/completions`
    Openai,
    /// InstructLab (OpenAI-compatible, local defaults)
    Instructlab,
    /// Any program that reads a prompt and prints a reply
    Command,
}

impl ProviderKind {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::Openai => "openai",
            Self::Instructlab => "instructlab",
            Self::Command => "command",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

/// Model selection.
#[derive(Debug, Clone, Default, Args)]
pub struct ProviderArgs {
    /// Model backend
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Model name
    #[arg(long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0-1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Server URL for HTTP providers
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Program for the `command` provider; `{prompt}`, `{model}` and `{temperature}` are substituted
    #[arg(long, value_name = "COMMAND")]
    pub agent_command: Option<String>,
}

/// Retry and feedback controls.
#[derive(Debug, Clone, Default, Args)]
#[allow(clippy::struct_excessive_bools)]
pub struct ValidationArgs {
    /// Do not validate; make a single attempt
    #[arg(long)]
    pub no_validate: bool,

    /// Exit with status 1 if the final query is still invalid
    #[arg(long)]
    pub strict: bool,

    /// Retry attempts after the first
    #[arg(long, value_name = "N")]
    pub retries: Option<usize>,

    /// Disable every feedback section in retry prompts
    #[arg(long)]
    pub no_feedback: bool,

    /// Leave diagnostics out of retry prompts
    #[arg(long)]
    pub no_feedback_errors: bool,

    /// Leave hints out of retry prompts
    #[arg(long)]
    pub no_feedback_hints: bool,

    /// Leave syntax examples out of retry prompts
    #[arg(long)]
    pub no_feedback_examples: bool,

    /// Disable extra emphasis on later attempts
    #[arg(long)]
    pub no_feedback_progressive: bool,

    /// Keep the temperature fixed across attempts
    #[arg(long)]
    pub no_retry_temp_adjust: bool,

    /// Temperature added per retry
    #[arg(long, value_name = "DELTA")]
    pub retry_temp_increment: Option<f32>,

    /// Ceiling for retry temperatures
    #[arg(long, value_name = "TEMP")]
    pub retry_temp_max: Option<f32>,

    /// Named bundle of settings: minimal, balanced, thorough, strict
    #[arg(long)]
    pub preset: Option<Preset>,
}

/// `kql generate`
#[derive(Debug, Clone, Default, Args)]
pub struct GenerateArgs {
    /// Description input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Target table name
    #[arg(short, long)]
    pub table: Option<String>,

    /// Table schema (comma-separated columns)
    #[arg(short, long)]
    pub schema: Option<String>,

    /// Model selection.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Retry controls.
    #[command(flatten)]
    pub validation: ValidationArgs,
}

/// `kql fix`
#[derive(Debug, Clone, Default, Args)]
pub struct FixArgs {
    /// Query input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Show the original and the suggested fix on stderr instead of printing it
    #[arg(long)]
    pub dry_run: bool,

    /// Model selection.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Retry controls.
    #[command(flatten)]
    pub validation: ValidationArgs,
}

/// `kql explain`
#[derive(Debug, Clone, Default, Args)]
pub struct ExplainArgs {
    /// Query input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Model selection.
    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// What `kql suggest` concentrates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FocusArg {
    /// Execution speed
    Performance,
    /// Clarity
    Readability,
    /// Likely bugs
    Correctness,
    /// Everything
    #[default]
    All,
}

impl From<FocusArg> for SuggestFocus {
    fn from(focus: FocusArg) -> Self {
        match focus {
            FocusArg::Performance => Self::Performance,
            FocusArg::Readability => Self::Readability,
            FocusArg::Correctness => Self::Correctness,
            FocusArg::All => Self::All,
        }
    }
}

/// `kql suggest`
#[derive(Debug, Clone, Default, Args)]
pub struct SuggestArgs {
    /// Query input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Area to concentrate on
    #[arg(long, value_enum, default_value_t = FocusArg::All)]
    pub focus: FocusArg,

    /// Model selection.
    #[command(flatten)]
    pub provider: ProviderArgs,
}

/// Diagnostic output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LintFormat {
    /// `file:line:col: error: message`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// `kql lint`
#[derive(Debug, Clone, Default, Args)]
pub struct LintArgs {
    /// Files to check; `-` or none reads stdin
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = LintFormat::Text)]
    pub format: LintFormat,

    /// Print nothing when there are no issues
    #[arg(long)]
    pub quiet: bool,

    /// Ask the external validator for semantic checks (`{mode}` becomes `semantic`)
    #[arg(long)]
    pub semantic: bool,
}

impl LintArgs {
    /// Depth requested from the validator.
    #[must_use]
    pub const fn mode(&self) -> ValidationMode {
        if self.semantic {
            ValidationMode::Semantic
        } else {
            ValidationMode::Syntax
        }
    }
}

/// `kql config`
#[derive(Debug, Clone, Default, Args)]
pub struct ConfigArgs {
    /// Model selection to preview.
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Retry controls to preview.
    #[command(flatten)]
    pub validation: ValidationArgs,
}
