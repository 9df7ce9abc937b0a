//! What the caller does with a finished run.

use std::fmt::Write;

use super::GenerationResult;

/// Outcome of applying the strict/lenient policy to a result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Valid: print the query and succeed.
    Accept,
    /// Invalid, lenient: show the warning, print the query anyway, succeed.
    Warn(String),
    /// Invalid, strict: show the error, do not print the query, fail.
    Reject(String),
}

impl Disposition {
    /// Applies the policy.
    #[must_use]
    pub fn from_result(result: &GenerationResult, strict: bool) -> Self {
        if result.valid {
            Self::Accept
        } else if strict {
            Self::Reject(format_validation_error(result))
        } else {
            Self::Warn(format_validation_warning(result))
        }
    }

    /// Whether the query should be written to the result channel.
    #[must_use]
    pub const fn prints_query(&self) -> bool {
        !matches!(self, Self::Reject(_))
    }

    /// Whether the process should exit successfully.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Reject(_))
    }
}

/// Lenient-mode warning listing the final diagnostics.
#[must_use]
pub fn format_validation_warning(result: &GenerationResult) -> String {
    let mut sb = format!(
        "Warning: generated query has syntax errors (after {} attempt(s))\n",
        result.attempts
    );
    push_errors(&mut sb, result);
    sb
}

/// Strict-mode error listing the final diagnostics.
#[must_use]
pub fn format_validation_error(result: &GenerationResult) -> String {
    let mut sb = format!(
        "Error: failed to generate valid query after {} attempt(s)\n",
        result.attempts
    );
    push_errors(&mut sb, result);
    sb
}

fn push_errors(sb: &mut String, result: &GenerationResult) {
    for e in &result.errors {
        let _ = writeln!(sb, "  {e}");
    }
}
