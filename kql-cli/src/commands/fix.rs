use std::io::Write;

use kql_ai::extract::ResponseExtractor;
use kql_ai::generation::GenerationRequest;
use kql_ai::prompt::RepairPrompts;

use super::generate::{emit, report_metrics};
use super::{Session, Status};
use crate::errors::CliError;

/// Name the user's own query is validated under.
pub const INPUT_SOURCE_NAME: &str = "input";

/// Repairs `query`. A query that already validates is printed unchanged.
///
/// With `dry_run` the original and the suggestion go to `err` and nothing is
/// written to `out`.
///
/// # Errors
/// Returns an error when validation or the run aborts or output cannot be written.
pub async fn run(
    session: &Session,
    query: &str,
    dry_run: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Status, CliError> {
    let found = session.validate(INPUT_SOURCE_NAME, query).await?;
    if found.is_empty() {
        session.note("No syntax errors found in query.");
        writeln!(out, "{query}")?;
        return Ok(Status::Success);
    }

    session.note("Found errors:");
    for e in &found {
        session.note(&format!("  - {e}"));
    }
    session.announce();

    let prompts = RepairPrompts::new(found.iter().map(ToString::to_string).collect());
    let request = GenerationRequest::new(query);
    let result = session
        .controller()
        .run(
            session.provider.as_ref(),
            session.validator.as_ref(),
            &request,
            &prompts,
            &ResponseExtractor,
            &session.cancel,
        )
        .await?;
    report_metrics(session, &result);

    if dry_run {
        writeln!(err, "=== Original Query ===\n{query}\n")?;
        writeln!(err, "=== Suggested Fix ===\n{}\n", result.query)?;
        if result.valid {
            writeln!(err, "Suggested fix is syntactically valid")?;
        } else {
            writeln!(err, "Suggested fix still has errors:")?;
            for e in &result.errors {
                writeln!(err, "  {e}")?;
            }
        }
        return Ok(Status::Success);
    }

    emit(&result, session.settings.validation.strict, out, err)
}
