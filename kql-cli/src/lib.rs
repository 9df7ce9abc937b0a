//! The `kql` command: AI-assisted KQL generation, repair, explanation and linting.
//!
//! Settings are merged from defaults, `~/.kql/config.yaml`, `KQL_*` environment
//! variables, presets and flags (see [`settings`]). Model-backed commands open a
//! [`Session`](commands::Session) that bridges the configured adapters into the
//! `kql-ai` traits.

/// Provider and validator construction.
pub mod backends;
/// Command-line definitions.
pub mod cli;
/// Subcommands.
pub mod commands;
/// Error type.
pub mod errors;
/// Reading query text from arguments, files and stdin.
pub mod input;
/// Layered settings.
pub mod settings;

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use kql_ai::generation::{GenerationRequest, ProgressSink};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Commands, GlobalArgs, InputArgs, ProviderArgs, ValidationArgs};
use crate::commands::{Session, Status};
use crate::errors::CliError;
use crate::settings::{FileConfig, Overrides, Settings};

/// Runs one parsed command line against the real stdio.
///
/// `cancel` is also fired when the resolved deadline passes.
///
/// # Errors
/// Returns the first fatal error; strict rejections and lint findings are
/// `Ok(Status::Failure)`.
pub async fn run(cli: Cli, cancel: CancellationToken) -> Result<Status, CliError> {
    let file = settings::load_or_warn(cli.global.config.as_deref());
    let mut out = io::stdout();
    let mut err = io::stderr();

    match &cli.command {
        Commands::Generate(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                Some(&args.provider),
                Some(&args.validation),
                settings::GENERATE_TEMPERATURE,
            )?;
            let text = read_stdio_input(&args.input)?;
            let session = open_session(&cli.global, settings, &cancel)?;
            let mut request = GenerationRequest::new(text);
            request.table.clone_from(&args.table);
            request.schema.clone_from(&args.schema);
            commands::generate::run(&session, &request, &mut out, &mut err).await
        }
        Commands::Fix(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                Some(&args.provider),
                Some(&args.validation),
                settings::FIX_TEMPERATURE,
            )?;
            let query = read_stdio_input(&args.input)?;
            let session = open_session(&cli.global, settings, &cancel)?;
            commands::fix::run(&session, &query, args.dry_run, &mut out, &mut err).await
        }
        Commands::Explain(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                Some(&args.provider),
                None,
                settings::EXPLAIN_TEMPERATURE,
            )?;
            let query = read_stdio_input(&args.input)?;
            let session = open_session(&cli.global, settings, &cancel)?;
            commands::explain::run(&session, &query, &mut out).await
        }
        Commands::Suggest(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                Some(&args.provider),
                None,
                settings::SUGGEST_TEMPERATURE,
            )?;
            let query = read_stdio_input(&args.input)?;
            let session = open_session(&cli.global, settings, &cancel)?;
            commands::suggest::run(&session, &query, args.focus.into(), &mut out).await
        }
        Commands::Lint(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                None,
                None,
                settings::GENERATE_TEMPERATURE,
            )?;
            arm_deadline(&cancel, settings.timeout());
            let validator = backends::build_validator(&settings, args.mode())?;
            commands::lint::run(
                validator.as_ref(),
                &cancel,
                &args.files,
                args.format,
                args.quiet,
                io::stdin(),
                &mut out,
            )
            .await
        }
        Commands::Config(args) => {
            let settings = effective(
                &cli.global,
                file.as_ref(),
                Some(&args.provider),
                Some(&args.validation),
                settings::GENERATE_TEMPERATURE,
            )?;
            commands::config::run(&settings, &mut out)
        }
    }
}

fn effective(
    global: &GlobalArgs,
    file: Option<&FileConfig>,
    provider: Option<&ProviderArgs>,
    validation: Option<&ValidationArgs>,
    command_temperature: f32,
) -> Result<Settings, CliError> {
    let overrides = Overrides {
        provider,
        validation,
        validator_command: global.validator_command.as_deref(),
        timeout: global.timeout,
    };
    settings::resolve(file, |k| std::env::var(k).ok(), &overrides, command_temperature)
}

fn read_stdio_input(args: &InputArgs) -> Result<String, CliError> {
    let stdin = io::stdin();
    let is_terminal = stdin.is_terminal();
    input::read_input(&args.text, args.file.as_deref(), stdin, is_terminal)
}

fn open_session(
    global: &GlobalArgs,
    settings: Settings,
    cancel: &CancellationToken,
) -> Result<Session, CliError> {
    arm_deadline(cancel, settings.timeout());
    let progress = (global.verbose || global.debug).then(stderr_sink);
    let debug = global.debug.then(stderr_sink);
    Ok(Session::open(settings, cancel.clone())?.with_sinks(progress, debug))
}

fn stderr_sink() -> Arc<dyn ProgressSink> {
    Arc::new(|line: &str| eprintln!("{line}"))
}

/// Cancels `cancel` once `timeout` has elapsed.
pub fn arm_deadline(cancel: &CancellationToken, timeout: Duration) {
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            () = token.cancelled() => {}
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(secs = timeout.as_secs(), "deadline reached, cancelling");
                token.cancel();
            }
        }
    });
}
