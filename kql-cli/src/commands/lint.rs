use std::io::{Read, Write};
use std::path::Path;

use kql_ai::Validator;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use super::{validate, Status};
use crate::cli::LintFormat;
use crate::errors::CliError;

/// One finding, as printed by `--format json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintDiagnostic {
    /// File name, or `stdin`.
    pub file: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Always `error` for syntax findings.
    pub severity: &'static str,
    /// Diagnostic text.
    pub message: String,
}

/// Checks every file (or stdin for none or `-`) and prints the findings.
///
/// Returns `Status::Failure` when anything was found.
///
/// # Errors
/// Returns an error when a file cannot be read, the validator cannot run, or
/// output cannot be written.
pub async fn run<R: Read>(
    validator: &dyn Validator,
    cancel: &CancellationToken,
    files: &[impl AsRef<Path>],
    format: LintFormat,
    quiet: bool,
    mut stdin: R,
    out: &mut dyn Write,
) -> Result<Status, CliError> {
    // stdin is read at most once; a repeated `-` reuses the text.
    let mut stdin_text: Option<String> = None;
    let mut inputs: Vec<(String, String)> = Vec::new();
    if files.is_empty() {
        let text = read_stdin_once(&mut stdin, &mut stdin_text)?;
        inputs.push(("stdin".to_string(), text));
    }
    for file in files {
        let path = file.as_ref();
        if path == Path::new("-") {
            let text = read_stdin_once(&mut stdin, &mut stdin_text)?;
            inputs.push(("stdin".to_string(), text));
        } else {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
                path: path.display().to_string(),
                source,
            })?;
            inputs.push((path.display().to_string(), text));
        }
    }

    let mut diagnostics = Vec::new();
    for (name, text) in &inputs {
        for e in validate(validator, cancel, name, text).await? {
            diagnostics.push(LintDiagnostic {
                file: name.clone(),
                line: e.line,
                column: e.column,
                severity: "error",
                message: e.message,
            });
        }
    }
    tracing::debug!(files = inputs.len(), diagnostics = diagnostics.len(), "lint finished");

    match format {
        LintFormat::Json => {
            for d in &diagnostics {
                let line = serde_json::to_string(d).map_err(|e| CliError::Serialize(e.to_string()))?;
                writeln!(out, "{line}")?;
            }
        }
        LintFormat::Text => {
            for d in &diagnostics {
                writeln!(out, "{}:{}:{}: {}: {}", d.file, d.line, d.column, d.severity, d.message)?;
            }
            if diagnostics.is_empty() && !quiet {
                writeln!(out, "No issues found.")?;
            }
        }
    }

    Ok(if diagnostics.is_empty() {
        Status::Success
    } else {
        Status::Failure
    })
}

fn read_stdin_once(
    stdin: &mut impl Read,
    cached: &mut Option<String>,
) -> Result<String, CliError> {
    if let Some(text) = cached {
        return Ok(text.clone());
    }
    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .map_err(|source| CliError::ReadInput {
            path: "stdin".to_string(),
            source,
        })?;
    Ok(cached.insert(text).clone())
}
