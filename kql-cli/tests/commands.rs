use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kql_ai::generation::{GenerationError, GenerationRequest, ProgressSink};
use kql_ai::prompt::SuggestFocus;
use kql_ai::{LexicalValidator, Provider, ProviderError};
use kql_cli::cli::ValidationArgs;
use kql_cli::commands::{explain, fix, generate, suggest, Session, Status};
use kql_cli::errors::CliError;
use kql_cli::settings::{resolve, Overrides, FIX_TEMPERATURE, GENERATE_TEMPERATURE};
use tokio_util::sync::CancellationToken;

/// Replays canned replies and records every prompt.
#[derive(Default)]
struct StubProvider {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl StubProvider {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok((*r).to_string())).collect()),
            prompts: Mutex::default(),
        })
    }

    fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(error)])),
            prompts: Mutex::default(),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }

    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("no more replies".to_string())))
    }
}

fn session(provider: Arc<StubProvider>, flags: &ValidationArgs, temperature: f32) -> Session {
    let overrides = Overrides {
        validation: Some(flags),
        ..Overrides::default()
    };
    let settings = resolve(None, |_| None, &overrides, temperature).unwrap();
    Session {
        settings,
        provider,
        validator: Arc::new(LexicalValidator),
        cancel: CancellationToken::new(),
        progress: None,
        debug: None,
    }
}

fn collector() -> (Arc<Mutex<Vec<String>>>, Arc<dyn ProgressSink>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink_lines = Arc::clone(&lines);
    let sink: Arc<dyn ProgressSink> =
        Arc::new(move |line: &str| sink_lines.lock().unwrap().push(line.to_string()));
    (lines, sink)
}

fn text(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

const BROKEN: &str = "T | summarize count( by State";

#[tokio::test]
async fn test_generate_prints_extracted_query() {
    let provider = StubProvider::new(&["Here you go:\n```kql\nStormEvents | count\n```"]);
    let s = session(provider.clone(), &ValidationArgs::default(), GENERATE_TEMPERATURE);
    let request = GenerationRequest::new("count storms").with_table("StormEvents");

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = generate::run(&s, &request, &mut out, &mut err).await.unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(text(out), "StormEvents | count\n");
    assert!(err.is_empty());
    assert!(provider.prompts()[0].contains("Target table: StormEvents"));
}

#[tokio::test]
async fn test_generate_lenient_warns_and_prints() {
    let provider = StubProvider::new(&[BROKEN, BROKEN]);
    let flags = ValidationArgs {
        retries: Some(1),
        ..ValidationArgs::default()
    };
    let s = session(provider, &flags, GENERATE_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = generate::run(&s, &GenerationRequest::new("x"), &mut out, &mut err)
        .await
        .unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(text(out), format!("{BROKEN}\n"));
    let err = text(err);
    assert!(err.starts_with("Warning: generated query has syntax errors (after 2 attempt(s))"));
    assert!(err.contains("  Line 1, Column 20: expected ')' to close '('"));
}

#[tokio::test]
async fn test_generate_strict_rejects() {
    let provider = StubProvider::new(&[BROKEN, BROKEN]);
    let flags = ValidationArgs {
        retries: Some(1),
        strict: true,
        ..ValidationArgs::default()
    };
    let s = session(provider, &flags, GENERATE_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = generate::run(&s, &GenerationRequest::new("x"), &mut out, &mut err)
        .await
        .unwrap();

    assert_eq!(status, Status::Failure);
    assert!(out.is_empty());
    assert!(text(err).starts_with("Error: failed to generate valid query after 2 attempt(s)"));
}

#[tokio::test]
async fn test_generate_provider_error_aborts() {
    let provider = StubProvider::failing(ProviderError::Status {
        status: 500,
        body: "boom".to_string(),
    });
    let s = session(provider, &ValidationArgs::default(), GENERATE_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let e = generate::run(&s, &GenerationRequest::new("x"), &mut out, &mut err)
        .await
        .unwrap_err();
    assert!(matches!(
        e,
        CliError::Generation(GenerationError::Provider { attempt: 1, .. })
    ));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_fix_valid_query_is_echoed() {
    let provider = StubProvider::new(&[]);
    let s = session(provider.clone(), &ValidationArgs::default(), FIX_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = fix::run(&s, "T | take 10", false, &mut out, &mut err).await.unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(text(out), "T | take 10\n");
    assert!(provider.prompts().is_empty());
}

#[tokio::test]
async fn test_fix_repairs_with_initial_diagnostics() {
    let provider = StubProvider::new(&["T | summarize count() by State"]);
    let s = session(provider.clone(), &ValidationArgs::default(), FIX_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = fix::run(&s, BROKEN, false, &mut out, &mut err).await.unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(text(out), "T | summarize count() by State\n");
    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Errors found:\n1. Line 1, Column 20: expected ')' to close '('"));
    assert!(prompt.contains(BROKEN));
}

#[tokio::test]
async fn test_fix_dry_run_writes_only_to_stderr() {
    let provider = StubProvider::new(&["T | summarize count() by State"]);
    let s = session(provider, &ValidationArgs::default(), FIX_TEMPERATURE);

    let (mut out, mut err) = (Vec::new(), Vec::new());
    let status = fix::run(&s, BROKEN, true, &mut out, &mut err).await.unwrap();

    assert_eq!(status, Status::Success);
    assert!(out.is_empty());
    let err = text(err);
    assert!(err.contains(&format!("=== Original Query ===\n{BROKEN}\n")));
    assert!(err.contains("=== Suggested Fix ===\nT | summarize count() by State\n"));
    assert!(err.contains("Suggested fix is syntactically valid"));
}

#[tokio::test]
async fn test_explain_verbose_adds_parse_context() {
    let provider = StubProvider::new(&["It counts rows.\n"]);
    let (lines, sink) = collector();
    let s = session(provider.clone(), &ValidationArgs::default(), GENERATE_TEMPERATURE)
        .with_sinks(Some(sink), None);

    let mut out = Vec::new();
    let status = explain::run(&s, "T | count", &mut out).await.unwrap();

    assert_eq!(status, Status::Success);
    assert_eq!(text(out), "It counts rows.\n");
    assert!(provider.prompts()[0].contains("Query syntax is valid."));
    assert!(lines
        .lock()
        .unwrap()
        .contains(&"Using stub provider with model stub-model...".to_string()));
}

#[tokio::test]
async fn test_explain_quiet_skips_parse_context() {
    let provider = StubProvider::new(&["It counts rows."]);
    let s = session(provider.clone(), &ValidationArgs::default(), GENERATE_TEMPERATURE);

    let mut out = Vec::new();
    explain::run(&s, "T | count(", &mut out).await.unwrap();
    let prompt = &provider.prompts()[0];
    assert!(!prompt.contains("syntax issue"));
    assert!(!prompt.contains("Query syntax is valid."));
}

#[tokio::test]
async fn test_suggest_sends_analysis() {
    let provider = StubProvider::new(&["1. Filter earlier."]);
    let s = session(provider.clone(), &ValidationArgs::default(), GENERATE_TEMPERATURE);

    let mut out = Vec::new();
    suggest::run(&s, "T | where x > 1 | take 10", SuggestFocus::Performance, &mut out)
        .await
        .unwrap();

    assert_eq!(text(out), "1. Filter earlier.\n");
    let prompt = &provider.prompts()[0];
    assert!(prompt.contains("Query analysis:\n- Syntax: valid\n- Operators used: where, take"));
    assert!(prompt.contains("Focus on performance"));
}

#[tokio::test]
async fn test_cancelled_session() {
    let provider = StubProvider::new(&["unused"]);
    let s = session(provider.clone(), &ValidationArgs::default(), GENERATE_TEMPERATURE);
    s.cancel.cancel();

    let mut out = Vec::new();
    let e = explain::run(&s, "T | count", &mut out).await.unwrap_err();
    assert!(matches!(e, CliError::Cancelled));
    assert!(provider.prompts().is_empty());
}
