use std::io::Write;

use kql_ai::prompt::explain_prompt;

use super::fix::INPUT_SOURCE_NAME;
use super::{Session, Status};
use crate::errors::CliError;

/// Asks the model to explain `query` and prints the answer verbatim.
///
/// When verbose the query is validated first and the outcome is added to the prompt.
///
/// # Errors
/// Returns an error when validation or the provider call fails.
pub async fn run(session: &Session, query: &str, out: &mut dyn Write) -> Result<Status, CliError> {
    let context = if session.progress.is_some() {
        Some(parse_context(session.validate(INPUT_SOURCE_NAME, query).await?.len()))
    } else {
        None
    };
    session.announce();

    let prompt = explain_prompt(query, context.as_deref());
    let answer = session.ask(&prompt, "getting explanation").await?;
    writeln!(out, "{}", answer.trim_end())?;
    Ok(Status::Success)
}

fn parse_context(issues: usize) -> String {
    if issues == 0 {
        "Query syntax is valid.".to_string()
    } else {
        format!("Note: Query has {issues} syntax issue(s).")
    }
}
