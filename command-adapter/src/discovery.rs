//! Locates an external program on the host system.

use crate::error::CommandError;
use std::path::PathBuf;
use which::which;

/// Environment variable that overrides the agent program path.
pub const AGENT_BIN_ENV_VAR: &str = "KQL_AGENT_BIN";

/// Locates an executable.
///
/// Resolution order:
/// 1. `explicit_path` if provided and the file exists. A bare name is looked up on `$PATH`.
/// 2. The path in the `KQL_AGENT_BIN` environment variable.
/// 3. `name` resolved via `$PATH`.
///
/// # Errors
///
/// Returns `CommandError::ExecutableNotFound` when nothing resolves.
pub fn discover_program(explicit_path: Option<PathBuf>, name: &str) -> Result<PathBuf, CommandError> {
    discover_with_env(explicit_path, name, std::env::var_os(AGENT_BIN_ENV_VAR).map(PathBuf::from))
}

fn discover_with_env(
    explicit_path: Option<PathBuf>,
    name: &str,
    env_path: Option<PathBuf>,
) -> Result<PathBuf, CommandError> {
    // 1. Explicit path
    if let Some(path) = explicit_path {
        if path.exists() {
            return Ok(path);
        }
        if path.components().count() == 1 {
            if let Ok(found) = which(&path) {
                return Ok(found);
            }
        }
        return Err(CommandError::ExecutableNotFound(format!(
            "explicit path does not exist: {}",
            path.display()
        )));
    }

    // 2. Environment variable
    if let Some(path) = env_path {
        if path.exists() {
            return Ok(path);
        }
        tracing::warn!(path = %path.display(), "{AGENT_BIN_ENV_VAR} points at a missing file");
    }

    // 3. PATH lookup
    if let Ok(path) = which(name) {
        return Ok(path);
    }

    Err(CommandError::ExecutableNotFound(format!(
        "{name} not found. Searched: {AGENT_BIN_ENV_VAR}, PATH."
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = discover_with_env(
            Some(file.path().to_path_buf()),
            "definitely-not-a-real-binary",
            Some(PathBuf::from("/nonexistent")),
        )
        .unwrap();
        assert_eq!(found, file.path());
    }

    #[test]
    fn test_missing_explicit_path_is_an_error() {
        let err = discover_with_env(Some(PathBuf::from("/no/such/kql-agent")), "sh", None).unwrap_err();
        assert!(matches!(err, CommandError::ExecutableNotFound(_)));
    }

    #[test]
    fn test_env_path_before_search() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let found = discover_with_env(
            None,
            "definitely-not-a-real-binary",
            Some(file.path().to_path_buf()),
        )
        .unwrap();
        assert_eq!(found, file.path());
    }

    #[test]
    fn test_nothing_found() {
        let err = discover_with_env(None, "definitely-not-a-real-binary-kql", None).unwrap_err();
        assert!(err.to_string().contains("definitely-not-a-real-binary-kql"));
    }

    #[cfg(unix)]
    #[test]
    fn test_path_lookup() {
        assert!(discover_with_env(None, "sh", None).is_ok());
        assert!(discover_with_env(Some(PathBuf::from("sh")), "unused", None).is_ok());
    }
}
