use std::io::Write;

use kql_ai::extract::ResponseExtractor;
use kql_ai::generation::{Disposition, GenerationRequest, GenerationResult};
use kql_ai::prompt::GeneratePrompts;

use super::{Session, Status};
use crate::errors::CliError;

/// Generates a query for `request` and applies the strict/lenient policy.
///
/// # Errors
/// Returns an error when the run aborts or output cannot be written.
pub async fn run(
    session: &Session,
    request: &GenerationRequest,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Status, CliError> {
    session.announce();
    let result = session
        .controller()
        .run(
            session.provider.as_ref(),
            session.validator.as_ref(),
            request,
            &GeneratePrompts,
            &ResponseExtractor,
            &session.cancel,
        )
        .await?;
    report_metrics(session, &result);
    emit(&result, session.settings.validation.strict, out, err)
}

/// Writes the result under the strict/lenient policy.
///
/// # Errors
/// Returns `CliError::Io` when writing fails.
pub fn emit(
    result: &GenerationResult,
    strict: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Status, CliError> {
    let disposition = Disposition::from_result(result, strict);
    match &disposition {
        Disposition::Accept => {}
        Disposition::Warn(msg) | Disposition::Reject(msg) => err.write_all(msg.as_bytes())?,
    }
    if disposition.prints_query() {
        writeln!(out, "{}", result.query)?;
    }
    Ok(if disposition.is_success() {
        Status::Success
    } else {
        Status::Failure
    })
}

pub(crate) fn report_metrics(session: &Session, result: &GenerationResult) {
    let m = &result.metrics;
    tracing::info!(
        attempts = m.total_attempts,
        input_tokens = m.estimated_input_tokens,
        output_tokens = m.estimated_output_tokens,
        elapsed_ms = u64::try_from(m.wall_time.as_millis()).unwrap_or(u64::MAX),
        "generation finished"
    );
    session.note(&format!(
        "{} attempt(s), ~{} input / ~{} output tokens, {:.1}s",
        m.total_attempts,
        m.estimated_input_tokens,
        m.estimated_output_tokens,
        m.wall_time.as_secs_f64()
    ));
}
