//! Gathers the text a subcommand works on.

use std::io::Read;
use std::path::Path;

use crate::errors::CliError;

/// Resolves input with precedence: positional text, then `--file`, then stdin.
///
/// Stdin is only read when `stdin_is_terminal` is false. The result is
/// trimmed; blank input is an error.
///
/// # Errors
/// Returns `NoInput` when nothing was supplied, `EmptyInput` for blank text and
/// `ReadInput` when a file or stdin cannot be read.
pub fn read_input<R: Read>(
    text: &[String],
    file: Option<&Path>,
    mut stdin: R,
    stdin_is_terminal: bool,
) -> Result<String, CliError> {
    let (raw, origin) = if !text.is_empty() {
        (text.join(" "), "arguments".to_string())
    } else if let Some(path) = file {
        let raw = std::fs::read_to_string(path).map_err(|source| CliError::ReadInput {
            path: path.display().to_string(),
            source,
        })?;
        (raw, path.display().to_string())
    } else if stdin_is_terminal {
        return Err(CliError::NoInput);
    } else {
        let mut raw = String::new();
        stdin
            .read_to_string(&mut raw)
            .map_err(|source| CliError::ReadInput {
                path: "stdin".to_string(),
                source,
            })?;
        (raw, "stdin".to_string())
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CliError::EmptyInput(origin));
    }
    Ok(trimmed.to_string())
}
