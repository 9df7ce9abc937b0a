//! Error types for the kql command.

use thiserror::Error;

/// Errors surfaced by the `kql` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Nothing to work on.
    #[error("no input provided (use -f <file>, stdin, or pass text as an argument)")]
    NoInput,

    /// The input was present but blank.
    #[error("empty input from {0}")]
    EmptyInput(String),

    /// An input file or stream could not be read.
    #[error("reading {path}: {source}")]
    ReadInput {
        /// File name, or `stdin`.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Settings are inconsistent or unusable.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A generate or fix run aborted.
    #[error(transparent)]
    Generation(#[from] kql_ai::generation::GenerationError),

    /// A single-shot provider call failed.
    #[error("{context}: {source}")]
    Provider {
        /// What was being asked for.
        context: &'static str,
        /// Underlying cause.
        #[source]
        source: kql_ai::ProviderError,
    },

    /// The validator could not be run.
    #[error(transparent)]
    Validator(#[from] kql_ai::ValidatorError),

    /// An external command could not be located or configured.
    #[error(transparent)]
    Command(#[from] command_adapter::CommandError),

    /// The run was interrupted or hit its deadline.
    #[error("cancelled")]
    Cancelled,

    /// Writing results failed.
    #[error("writing output: {0}")]
    Io(#[from] std::io::Error),

    /// Rendering settings or diagnostics failed.
    #[error("serializing output: {0}")]
    Serialize(String),
}
