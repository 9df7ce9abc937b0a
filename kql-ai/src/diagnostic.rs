//! Positioned validator diagnostics.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `<source-name>:<line>:<column>: <message>`
#[allow(clippy::expect_used)]
static POSITIONED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^:]+:(\d+):(\d+): (.+)$").expect("static pattern compiles"));

/// One diagnostic reported by a validator for a candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// Diagnostic text without the position prefix.
    pub message: String,
}

impl ValidationError {
    /// Creates a diagnostic at an explicit position.
    #[must_use]
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }

    /// Parses a rendered validator diagnostic.
    ///
    /// Text that is not in the `<source>:<line>:<col>: <message>` shape is kept whole
    /// and placed at line 1, column 1.
    ///
    /// # Examples
    ///
    /// ```
    /// use kql_ai::ValidationError;
    ///
    /// let e = ValidationError::from_diagnostic("generated.kql:1:5: expected ')'");
    /// assert_eq!((e.line, e.column), (1, 5));
    /// assert_eq!(e.message, "expected ')'");
    ///
    /// let opaque = ValidationError::from_diagnostic("something odd");
    /// assert_eq!((opaque.line, opaque.column), (1, 1));
    /// assert_eq!(opaque.message, "something odd");
    /// ```
    #[must_use]
    pub fn from_diagnostic(raw: &str) -> Self {
        let trimmed = raw.trim();
        if let Some(caps) = POSITIONED.captures(trimmed) {
            let line = caps[1].parse::<usize>().ok();
            let column = caps[2].parse::<usize>().ok();
            if let (Some(line), Some(column)) = (line, column) {
                return Self::new(line, column, &caps[3]);
            }
        }
        Self::new(1, 1, trimmed)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, Column {}: {}", self.line, self.column, self.message)
    }
}

/// Renders a diagnostic in the positioned shape validators emit.
#[must_use]
pub fn render_diagnostic(source_name: &str, line: usize, column: usize, message: &str) -> String {
    format!("{source_name}:{line}:{column}: {message}")
}
