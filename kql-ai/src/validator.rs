//! The query-validation boundary and a built-in lexical fallback.

use async_trait::async_trait;
use thiserror::Error;

use crate::diagnostic::render_diagnostic;

/// The validator itself could not run. Distinct from the query having diagnostics.
#[derive(Debug, Error)]
pub enum ValidatorError {
    /// An external validator process failed to start or finish.
    #[error("validator process failed: {0}")]
    Process(String),

    /// The validator is misconfigured.
    #[error("validator misconfigured: {0}")]
    Config(String),
}

/// How deep a validator looks.
///
/// Validators that only have one depth, like [`LexicalValidator`], ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Parse errors only.
    #[default]
    Syntax,
    /// Parse errors plus name and type resolution.
    Semantic,
}

impl ValidationMode {
    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Syntax => "syntax",
            Self::Semantic => "semantic",
        }
    }
}

/// Checks a candidate query.
///
/// Each returned string is one diagnostic, ideally rendered as
/// `<source_name>:<line>:<column>: <message>`. An empty list means the query is valid.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validates `text`, naming it `source_name` in diagnostics.
    async fn validate(&self, source_name: &str, text: &str) -> Result<Vec<String>, ValidatorError>;
}

#[async_trait]
impl<V: Validator + ?Sized> Validator for std::sync::Arc<V> {
    async fn validate(&self, source_name: &str, text: &str) -> Result<Vec<String>, ValidatorError> {
        (**self).validate(source_name, text).await
    }
}

/// Parser-free structural checks.
///
/// Catches the mistakes models make most often: unbalanced brackets,
/// unterminated strings, stray backticks and empty pipe stages. It does not
/// understand KQL grammar; configure an external validator for that.
/// There is one depth only, so [`ValidationMode`] does not apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalValidator;

#[async_trait]
impl Validator for LexicalValidator {
    async fn validate(&self, source_name: &str, text: &str) -> Result<Vec<String>, ValidatorError> {
        Ok(lexical_diagnostics(source_name, text))
    }
}

#[derive(Debug, Clone, Copy)]
struct Pos {
    line: usize,
    column: usize,
}

/// Runs the lexical checks and renders every finding.
#[must_use]
pub fn lexical_diagnostics(source_name: &str, text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut push = |pos: Pos, message: &str| {
        out.push(render_diagnostic(source_name, pos.line, pos.column, message));
    };

    if text.trim().is_empty() {
        push(Pos { line: 1, column: 1 }, "empty query");
        return out;
    }

    let mut stack: Vec<(char, Pos)> = Vec::new();
    let mut last_significant: Option<(char, Pos)> = None;
    let mut chars = text.chars().peekable();
    let mut pos = Pos { line: 1, column: 1 };

    let advance = |c: char, pos: &mut Pos| {
        if c == '\n' {
            pos.line += 1;
            pos.column = 1;
        } else {
            pos.column += 1;
        }
    };

    while let Some(c) = chars.next() {
        let here = pos;
        advance(c, &mut pos);

        match c {
            '/' if chars.peek() == Some(&'/') => {
                for c in chars.by_ref() {
                    advance(c, &mut pos);
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }
            '\'' | '"' => {
                let mut closed = false;
                while let Some(s) = chars.next() {
                    advance(s, &mut pos);
                    if s == '\\' {
                        if let Some(escaped) = chars.next() {
                            advance(escaped, &mut pos);
                        }
                    } else if s == c {
                        closed = true;
                        break;
                    } else if s == '\n' {
                        break;
                    }
                }
                if !closed {
                    push(here, "unterminated string literal");
                }
            }
            '`' => push(here, "illegal character '`' (do not wrap the query in backticks)"),
            '(' | '[' | '{' => stack.push((c, here)),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((o, _)) if o == open => {}
                    Some((o, _)) => {
                        push(here, &format!("expected '{}' but found '{c}'", closing(o)));
                    }
                    None => push(here, &format!("unmatched '{c}'")),
                }
            }
            '|' => {
                if let Some(('|', _)) = last_significant {
                    push(here, "expected operator after '|'");
                }
            }
            _ => {}
        }

        if !c.is_whitespace() {
            last_significant = Some((c, here));
        }
    }

    for (open, at) in stack {
        push(at, &format!("expected '{}' to close '{open}'", closing(open)));
    }
    if let Some(('|', at)) = last_significant {
        push(at, "expected operator after '|'");
    }

    out
}

const fn closing(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}
