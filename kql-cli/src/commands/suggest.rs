use std::fmt::Write as _;
use std::io::Write;

use kql_ai::prompt::{suggest_prompt, SuggestFocus};
use kql_ai::ValidationError;

use super::fix::INPUT_SOURCE_NAME;
use super::{Session, Status};
use crate::errors::CliError;

const KNOWN_OPERATORS: &[&str] = &[
    "where", "project", "extend", "summarize", "join", "union", "take", "top", "sort", "order",
    "distinct", "count", "limit", "mv-expand", "mv-apply", "parse", "evaluate", "render",
    "make-series", "lookup", "fork", "facet", "find", "search",
];

/// Asks the model for improvements to `query` and prints the answer verbatim.
///
/// # Errors
/// Returns an error when validation or the provider call fails.
pub async fn run(
    session: &Session,
    query: &str,
    focus: SuggestFocus,
    out: &mut dyn Write,
) -> Result<Status, CliError> {
    let errors = session.validate(INPUT_SOURCE_NAME, query).await?;
    let analysis = analysis(query, &errors);
    session.announce();
    session.note(&format!("Focus: {}", focus.as_str()));

    let prompt = suggest_prompt(query, &analysis, focus);
    let answer = session.ask(&prompt, "getting suggestions").await?;
    writeln!(out, "{}", answer.trim_end())?;
    Ok(Status::Success)
}

/// Pipe operators that appear in `query`, in a fixed order.
#[must_use]
pub fn operators_used(query: &str) -> Vec<&'static str> {
    let lower = query.to_lowercase();
    KNOWN_OPERATORS
        .iter()
        .copied()
        .filter(|op| lower.contains(&format!("| {op}")) || lower.contains(&format!("|{op}")))
        .collect()
}

/// Summary of the query handed to the model alongside it.
#[must_use]
pub fn analysis(query: &str, errors: &[ValidationError]) -> String {
    let mut sb = String::from("Query analysis:\n");
    if errors.is_empty() {
        sb.push_str("- Syntax: valid\n");
    } else {
        let _ = writeln!(sb, "- Syntax errors: {}", errors.len());
        for e in errors {
            let _ = writeln!(sb, "  - {e}");
        }
    }
    let ops = operators_used(query);
    if !ops.is_empty() {
        let _ = writeln!(sb, "- Operators used: {}", ops.join(", "));
    }
    sb
}
