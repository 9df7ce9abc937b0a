//! Argument templating for external command invocations.
//!
//! ## Placeholders
//! - `{prompt}`: the prompt text
//! - `{temperature}`: sampling temperature, two decimals
//! - `{model}`: model name
//! - `{source}`: name of the text being validated
//! - `{mode}`: validation depth (`syntax` or `semantic`)
//!
//! Placeholders may appear anywhere inside an argument, e.g. `--temp={temperature}`.
//! Unknown braces are left alone.

use crate::error::CommandError;
use crate::types::TemplateVars;
use std::ffi::OsString;

/// Substitutes placeholders in every template argument.
#[must_use]
pub fn build_args(template: &[String], vars: &TemplateVars<'_>) -> Vec<OsString> {
    let temperature = vars.temperature.map(|t| format!("{t:.2}")).unwrap_or_default();
    template
        .iter()
        .map(|arg| {
            OsString::from(
                arg.replace("{prompt}", vars.prompt.unwrap_or_default())
                    .replace("{temperature}", &temperature)
                    .replace("{model}", vars.model.unwrap_or_default())
                    .replace("{source}", vars.source.unwrap_or_default())
                    .replace("{mode}", vars.mode.unwrap_or_default()),
            )
        })
        .collect()
}

/// Whether any argument takes the prompt inline. If not, callers feed it on stdin.
#[must_use]
pub fn takes_prompt_inline(template: &[String]) -> bool {
    template.iter().any(|a| a.contains("{prompt}"))
}

/// Splits a one-line command into program and argument template on whitespace.
///
/// Arguments that contain spaces have to be configured as a list instead.
///
/// # Errors
/// Returns `InvalidTemplate` for an empty command line.
pub fn split_command_line(line: &str) -> Result<(String, Vec<String>), CommandError> {
    let mut parts = line.split_whitespace().map(str::to_string);
    let program = parts
        .next()
        .ok_or_else(|| CommandError::InvalidTemplate("empty command".to_string()))?;
    Ok((program, parts.collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_substitutes_all_placeholders() {
        let vars = TemplateVars {
            prompt: Some("count rows"),
            temperature: Some(0.3),
            model: Some("llama3.2"),
            source: Some("generated.kql"),
            mode: Some("semantic"),
        };
        let args = build_args(
            &template(&[
                "-m", "{model}", "--temp={temperature}", "{prompt}", "--name", "{source}",
                "--{mode}",
            ]),
            &vars,
        );
        assert_eq!(
            args,
            vec![
                "-m", "llama3.2", "--temp=0.30", "count rows", "--name", "generated.kql",
                "--semantic",
            ]
        );
    }

    #[test]
    fn test_missing_values_become_empty() {
        let args = build_args(&template(&["--model={model}", "{unknown}"]), &TemplateVars::default());
        assert_eq!(args, vec!["--model=", "{unknown}"]);
    }

    #[test]
    fn test_prompt_inline_detection() {
        assert!(takes_prompt_inline(&template(&["run", "--prompt={prompt}"])));
        assert!(!takes_prompt_inline(&template(&["run", "-"])));
    }

    #[test]
    fn test_split_command_line() {
        let (program, args) = split_command_line("  llm -m {model}  ").unwrap();
        assert_eq!(program, "llm");
        assert_eq!(args, vec!["-m", "{model}"]);
        assert!(split_command_line("   ").is_err());
    }
}
