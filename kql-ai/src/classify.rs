//! Keyword rules that turn validator diagnostics into corrective hints and examples.
//!
//! Matching is a lower-cased substring test over each diagnostic message. Output is
//! deduplicated and emitted in table order. An unrecognised message contributes
//! nothing; classification never fails.

use crate::diagnostic::ValidationError;

/// A keyword rule: if any keyword occurs in a diagnostic, every output is emitted.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Lower-case substrings to look for.
    pub keywords: &'static [&'static str],
    /// Text contributed when the rule fires.
    pub outputs: &'static [&'static str],
}

/// Attempt from which progressive feedback adds unconditional material.
pub const PROGRESSIVE_FROM_ATTEMPT: usize = 3;

/// Emphasis line added to retry prompts once progressive feedback kicks in.
pub const PROGRESSIVE_EMPHASIS: &str =
    "IMPORTANT: Please carefully check all parentheses, pipes, and operator syntax.";

/// Structural example added once progressive feedback kicks in.
pub const PROGRESSIVE_EXAMPLE: &str =
    "// Multi-line query structure:\nTable\n| where Condition\n| summarize count() by Column";

/// Hint rules.
pub const HINT_RULES: &[Rule] = &[
    Rule {
        keywords: &["expected ')'", "expected '('", "unclosed", "unmatched", "unbalanced"],
        outputs: &["Ensure all parentheses are balanced"],
    },
    Rule {
        keywords: &["expected '|'", "pipe"],
        outputs: &["Each operator should be on a new line starting with |"],
    },
    Rule {
        keywords: &["expected ','"],
        outputs: &["Multiple arguments should be separated by commas"],
    },
    Rule {
        keywords: &["expected operator", "unknown operator"],
        outputs: &["Common operators: where, project, summarize, extend, join, take, top, sort"],
    },
    Rule {
        keywords: &["'by'", "\"by\"", "by clause", "by-clause", "expected by"],
        outputs: &["The 'by' clause is used with summarize, top, and order operators"],
    },
    Rule {
        keywords: &["string", "quote"],
        outputs: &["Use single or double quotes for string literals"],
    },
    Rule {
        keywords: &["triple delimiter", "multi-line string", "illegal", "backtick"],
        outputs: &["Do NOT wrap output in backticks - output raw KQL only"],
    },
    Rule {
        keywords: &["datetime", "date"],
        outputs: &["Use datetime() for date values, e.g., datetime(2024-01-01)"],
    },
    Rule {
        keywords: &["timespan", "ago"],
        outputs: &["Use timespan literals like 1h, 7d, 30m or the ago() function"],
    },
];

/// Syntax example rules.
pub const EXAMPLE_RULES: &[Rule] = &[
    Rule {
        keywords: &["summarize", "count", "sum", "avg"],
        outputs: &[
            "T | summarize count() by Column",
            "T | summarize Total=sum(Value) by Category",
        ],
    },
    Rule {
        keywords: &["where", "filter"],
        outputs: &["T | where Column > 10", "T | where Name == 'value'"],
    },
    Rule {
        keywords: &["project"],
        outputs: &["T | project Column1, Column2", "T | project NewName = OldName"],
    },
    Rule {
        keywords: &["join"],
        outputs: &["T1 | join kind=inner T2 on CommonColumn"],
    },
    Rule {
        keywords: &["extend"],
        outputs: &["T | extend NewColumn = Expression"],
    },
    Rule {
        keywords: &["expected ')'", "expected '('"],
        outputs: &["Function calls: func(arg1, arg2)"],
    },
];

/// Evaluates `rules` against `errors`, deduplicating in table order.
#[must_use]
pub fn apply_rules(rules: &[Rule], errors: &[ValidationError]) -> Vec<&'static str> {
    let messages: Vec<String> = errors.iter().map(|e| e.message.to_lowercase()).collect();
    let mut out: Vec<&'static str> = Vec::new();

    for rule in rules {
        let fired = messages
            .iter()
            .any(|m| rule.keywords.iter().any(|k| m.contains(k)));
        if !fired {
            continue;
        }
        for &output in rule.outputs {
            if !out.contains(&output) {
                out.push(output);
            }
        }
    }

    out
}

/// Whether progressive feedback applies at `attempt`.
#[must_use]
pub const fn progressive_active(attempt: usize, progressive: bool) -> bool {
    progressive && attempt >= PROGRESSIVE_FROM_ATTEMPT
}

/// Maps diagnostics to hints and syntax examples.
#[derive(Debug, Clone, Copy)]
pub struct ErrorClassifier {
    hint_rules: &'static [Rule],
    example_rules: &'static [Rule],
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self {
            hint_rules: HINT_RULES,
            example_rules: EXAMPLE_RULES,
        }
    }
}

impl ErrorClassifier {
    /// Creates a classifier over custom rule tables.
    #[must_use]
    pub const fn with_rules(hint_rules: &'static [Rule], example_rules: &'static [Rule]) -> Self {
        Self {
            hint_rules,
            example_rules,
        }
    }

    /// Hints triggered by `errors`.
    #[must_use]
    pub fn hints(&self, errors: &[ValidationError]) -> Vec<&'static str> {
        apply_rules(self.hint_rules, errors)
    }

    /// Examples triggered by `errors`, plus the structural example on late progressive attempts.
    #[must_use]
    pub fn examples(
        &self,
        errors: &[ValidationError],
        attempt: usize,
        progressive: bool,
    ) -> Vec<&'static str> {
        let mut out = apply_rules(self.example_rules, errors);
        if progressive_active(attempt, progressive) && !out.contains(&PROGRESSIVE_EXAMPLE) {
            out.push(PROGRESSIVE_EXAMPLE);
        }
        out
    }

    /// Emphasis sentence for late progressive attempts.
    #[must_use]
    pub const fn emphasis(&self, attempt: usize, progressive: bool) -> Option<&'static str> {
        if progressive_active(attempt, progressive) {
            Some(PROGRESSIVE_EMPHASIS)
        } else {
            None
        }
    }
}
