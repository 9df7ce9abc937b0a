use std::io::Write;

use super::Status;
use crate::errors::CliError;
use crate::settings::Settings;

/// Prints the effective settings as YAML. API keys are masked.
///
/// # Errors
/// Returns an error when rendering or writing fails.
pub fn run(settings: &Settings, out: &mut dyn Write) -> Result<Status, CliError> {
    let yaml = serde_yaml::to_string(settings).map_err(|e| CliError::Serialize(e.to_string()))?;
    out.write_all(yaml.as_bytes())?;
    Ok(Status::Success)
}
