//! Prompt construction for first attempts and retries.

use std::fmt::Write;

use crate::classify::ErrorClassifier;
use crate::diagnostic::ValidationError;
use crate::generation::config::FeedbackConfig;
use crate::generation::GenerationRequest;

const RETRY_SEPARATOR: &str = "\n\n---\n\n";
const RETRY_CLOSING: &str = "Please fix these errors and provide a corrected query.";

/// Builds the prompts a run sends to its provider.
///
/// Implementors supply [`initial`](Self::initial); the retry shape is shared.
pub trait PromptBuilder: Send + Sync {
    /// Prompt for the first attempt.
    fn initial(&self, request: &GenerationRequest) -> String;

    /// Prompt for a later attempt, carrying feedback about `failed_candidate`.
    fn retry(
        &self,
        request: &GenerationRequest,
        failed_candidate: &str,
        errors: &[ValidationError],
        attempt: usize,
        feedback: &FeedbackConfig,
    ) -> String {
        compose_retry(
            &self.initial(request),
            failed_candidate,
            errors,
            attempt,
            feedback,
            &ErrorClassifier::default(),
        )
    }
}

/// Appends the failed candidate and gated feedback sections to `initial`.
///
/// Sections appear in the order errors, hints, examples, progressive emphasis.
/// A section with nothing to say is left out entirely.
#[must_use]
pub fn compose_retry(
    initial: &str,
    failed_candidate: &str,
    errors: &[ValidationError],
    attempt: usize,
    feedback: &FeedbackConfig,
    classifier: &ErrorClassifier,
) -> String {
    let mut sb = String::from(initial);
    sb.push_str(RETRY_SEPARATOR);
    sb.push_str("Your previous attempt had syntax errors:\n\n```kql\n");
    sb.push_str(failed_candidate);
    sb.push_str("\n```\n\n");

    if feedback.errors && !errors.is_empty() {
        sb.push_str("Errors:\n");
        for e in errors {
            let _ = writeln!(sb, "- {e}");
        }
        sb.push('\n');
    }

    if feedback.hints {
        let hints = classifier.hints(errors);
        if !hints.is_empty() {
            sb.push_str("Hints:\n");
            for h in hints {
                let _ = writeln!(sb, "- {h}");
            }
            sb.push('\n');
        }
    }

    if feedback.examples {
        let examples = classifier.examples(errors, attempt, feedback.progressive);
        if !examples.is_empty() {
            sb.push_str("Correct syntax examples:\n");
            for ex in examples {
                let _ = writeln!(sb, "{ex}");
            }
            sb.push('\n');
        }
    }

    if let Some(emphasis) = classifier.emphasis(attempt, feedback.progressive) {
        sb.push_str(emphasis);
        sb.push_str("\n\n");
    }

    sb.push_str(RETRY_CLOSING);
    sb
}

/// Prompts for generating a query from a natural-language description.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratePrompts;

impl PromptBuilder for GeneratePrompts {
    fn initial(&self, request: &GenerationRequest) -> String {
        let mut sb = String::from(
            "You are a Kusto Query Language (KQL) expert. Generate a KQL query based on the user's natural language description.

Rules:
1. Output ONLY the raw KQL query, no explanations
2. Do NOT wrap the query in backticks or code blocks
3. Use proper KQL syntax and operators
4. Include comments only if the query is complex
5. Prefer efficient query patterns
",
        );

        if let Some(table) = request.table.as_deref().filter(|t| !t.is_empty()) {
            let _ = write!(sb, "\nTarget table: {table}\n");
        }
        if let Some(schema) = request.schema.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(sb, "Available columns: {schema}");
        }

        let _ = write!(sb, "\nDescription: {}\n", request.prompt);
        sb.push_str("\nGenerate the KQL query:");
        sb
    }
}

/// Prompts for repairing a query known to be broken.
///
/// `request.prompt` holds the broken query; `initial_errors` are the diagnostics
/// it produced before any model was involved.
#[derive(Debug, Clone, Default)]
pub struct RepairPrompts {
    initial_errors: Vec<String>,
}

impl RepairPrompts {
    /// Creates a builder that reports `initial_errors` in the first prompt.
    #[must_use]
    pub const fn new(initial_errors: Vec<String>) -> Self {
        Self { initial_errors }
    }
}

impl PromptBuilder for RepairPrompts {
    fn initial(&self, request: &GenerationRequest) -> String {
        let mut sb = String::from(
            "You are a Kusto Query Language (KQL) expert. Fix the syntax errors in the following query.

Rules:
1. Output ONLY the corrected KQL query
2. Preserve the original intent of the query
3. Make minimal changes to fix the errors
4. Do not add features or optimizations, only fix errors
",
        );

        if let Some(table) = request.table.as_deref().filter(|t| !t.is_empty()) {
            let _ = write!(sb, "\nTarget table: {table}\n");
        }
        if let Some(schema) = request.schema.as_deref().filter(|s| !s.is_empty()) {
            let _ = writeln!(sb, "Available columns: {schema}");
        }

        if !self.initial_errors.is_empty() {
            sb.push_str("\nErrors found:\n");
            for (i, e) in self.initial_errors.iter().enumerate() {
                let _ = writeln!(sb, "{}. {e}", i + 1);
            }
        }

        let _ = write!(
            sb,
            "\nOriginal query with errors:\n```kql\n{}\n```\n\nOutput the corrected query:",
            request.prompt
        );
        sb
    }
}

/// Prompt asking for a plain-language explanation of `query`.
#[must_use]
pub fn explain_prompt(query: &str, parse_context: Option<&str>) -> String {
    let mut sb = String::from(
        "You are a Kusto Query Language (KQL) expert. Explain the following KQL query in clear, concise terms.

Describe:
1. What data sources the query uses
2. Any filtering or transformations applied
3. The aggregations or computations performed
4. What the output will look like

Keep the explanation accessible to someone familiar with SQL but new to KQL.",
    );
    if let Some(ctx) = parse_context.filter(|c| !c.is_empty()) {
        sb.push_str("\n\n");
        sb.push_str(ctx);
    }
    let _ = write!(sb, "\n\nQuery:\n```kql\n{query}\n```");
    sb
}

/// Areas `kql suggest` can concentrate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuggestFocus {
    /// Execution speed and efficiency.
    Performance,
    /// Clarity and maintainability.
    Readability,
    /// Potential bugs or logic issues.
    Correctness,
    /// Everything.
    #[default]
    All,
}

impl SuggestFocus {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Performance => "performance",
            Self::Readability => "readability",
            Self::Correctness => "correctness",
            Self::All => "all",
        }
    }

    const fn instructions(self) -> &'static str {
        match self {
            Self::Performance => {
                "Focus on performance: filter early, reduce columns before joins and aggregations, \
                 prefer has over contains, and avoid unnecessary sorts."
            }
            Self::Readability => {
                "Focus on readability: consistent formatting, meaningful column names, \
                 let statements for repeated expressions, and helpful comments."
            }
            Self::Correctness => {
                "Focus on correctness: null handling, type mismatches, join kinds, \
                 time-range boundaries, and aggregation semantics."
            }
            Self::All => "Cover performance, readability, and correctness.",
        }
    }
}

/// Prompt asking for improvement suggestions for `query`.
#[must_use]
pub fn suggest_prompt(query: &str, analysis: &str, focus: SuggestFocus) -> String {
    let mut sb = String::from(
        "You are a Kusto Query Language (KQL) expert. Review the following query and suggest concrete improvements.

For each suggestion give a short title, why it matters, and the rewritten KQL.
",
    );
    sb.push_str(focus.instructions());
    if !analysis.is_empty() {
        sb.push_str("\n\n");
        sb.push_str(analysis.trim_end());
    }
    let _ = write!(sb, "\n\nQuery:\n```kql\n{query}\n```");
    sb
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new("count rows by State")
            .with_table("StormEvents")
            .with_schema("State, StartTime")
    }

    #[test]
    fn test_generate_initial_embeds_context() {
        let p = GeneratePrompts.initial(&request());
        assert!(p.starts_with("You are a Kusto Query Language (KQL) expert."));
        assert!(p.contains("Do NOT wrap the query in backticks"));
        assert!(p.contains("Target table: StormEvents"));
        assert!(p.contains("Available columns: State, StartTime"));
        assert!(p.contains("Description: count rows by State"));
        assert!(p.ends_with("Generate the KQL query:"));
    }

    #[test]
    fn test_generate_initial_omits_missing_context() {
        let p = GeneratePrompts.initial(&GenerationRequest::new("anything"));
        assert!(!p.contains("Target table"));
        assert!(!p.contains("Available columns"));
    }

    #[test]
    fn test_retry_contains_candidate_and_sections_in_order() {
        let errors = vec![ValidationError::new(1, 5, "expected ')'")];
        let feedback = FeedbackConfig::all();
        let p = GeneratePrompts.retry(&request(), "T | summarize count(", &errors, 3, &feedback);

        assert!(p.starts_with(&GeneratePrompts.initial(&request())));
        assert!(p.contains("```kql\nT | summarize count(\n```"));
        assert!(p.contains("- Line 1, Column 5: expected ')'"));

        let order = [
            "Errors:",
            "Hints:",
            "Correct syntax examples:",
            "IMPORTANT:",
            RETRY_CLOSING,
        ];
        let positions: Vec<usize> = order.iter().map(|s| p.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{positions:?}");
    }

    #[test]
    fn test_retry_without_feedback_has_no_sections() {
        let errors = vec![ValidationError::new(1, 5, "expected ')'")];
        let p = GeneratePrompts.retry(&request(), "bad", &errors, 4, &FeedbackConfig::none());
        assert!(!p.contains("Errors:"));
        assert!(!p.contains("Hints:"));
        assert!(!p.contains("Correct syntax examples:"));
        assert!(!p.contains("IMPORTANT:"));
        assert!(p.ends_with(RETRY_CLOSING));
    }

    #[test]
    fn test_empty_classifier_output_omits_headers() {
        let errors = vec![ValidationError::new(2, 2, "xyzzy")];
        let feedback = FeedbackConfig {
            progressive: false,
            ..FeedbackConfig::all()
        };
        let p = GeneratePrompts.retry(&request(), "bad", &errors, 2, &feedback);
        assert!(p.contains("Errors:\n- Line 2, Column 2: xyzzy"));
        assert!(!p.contains("Hints:"));
        assert!(!p.contains("Correct syntax examples:"));
    }

    #[test]
    fn test_progressive_waits_for_third_attempt() {
        let errors = vec![ValidationError::new(1, 1, "xyzzy")];
        let feedback = FeedbackConfig::all();
        let second = GeneratePrompts.retry(&request(), "bad", &errors, 2, &feedback);
        let third = GeneratePrompts.retry(&request(), "bad", &errors, 3, &feedback);
        assert!(!second.contains("IMPORTANT:"));
        assert!(third.contains("IMPORTANT:"));
        assert!(third.contains("// Multi-line query structure:"));
    }

    #[test]
    fn test_repair_initial_lists_known_errors() {
        let prompts = RepairPrompts::new(vec!["input:1:20: expected ')'".to_string()]);
        let p = prompts.initial(&GenerationRequest::new("T | summarize count( by State"));
        assert!(p.contains("Fix the syntax errors"));
        assert!(p.contains("Errors found:\n1. input:1:20: expected ')'"));
        assert!(p.contains("```kql\nT | summarize count( by State\n```"));
        assert!(p.ends_with("Output the corrected query:"));
    }

    #[test]
    fn test_explain_and_suggest_prompts() {
        let e = explain_prompt("T | take 1", Some("Query syntax is valid."));
        assert!(e.contains("Query syntax is valid."));
        assert!(e.ends_with("```kql\nT | take 1\n```"));

        let s = suggest_prompt("T | take 1", "Query analysis:\n- Syntax: valid\n", SuggestFocus::Performance);
        assert!(s.contains("Focus on performance"));
        assert!(s.contains("- Syntax: valid\n\nQuery:"));
    }
}
