//! Isolating a candidate query from free-form model output.
//!
//! Models are told to answer with the bare query, but they routinely wrap it in
//! fenced blocks, inline backticks, or a sentence of explanation. The extractor
//! peels those layers off in a fixed priority order and never fails: when nothing
//! recognisable is found, the trimmed input is returned and the validator decides.

const FENCE: &str = "```";
const DELIMITER: char = '`';

/// Info strings that mark a fenced block as a KQL query.
const QUERY_LANGUAGE_TAGS: &[&str] = &["kql", "kusto"];

/// Line prefixes (lower-cased) that open a query even without a leading identifier.
const QUERY_STARTERS: &[&str] = &["let ", "//", "/*", "declare ", "set ", "print ", "datatable"];

/// Line prefixes (lower-cased) that mark explanatory prose rather than query text.
const PROSE_STARTERS: &[&str] = &[
    "this query",
    "the query",
    "this will",
    "explanation:",
    "note:",
    "here's",
    "here is",
    "the above",
    "below is",
    "the following",
    "sure,",
    "sure!",
    "certainly",
];

/// Pulls the candidate query out of a raw provider response.
pub trait Extractor: Send + Sync {
    /// Returns the best guess at the query text. Must never fail.
    fn extract(&self, raw: &str) -> String;
}

/// Rule-table driven extractor for KQL responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseExtractor;

impl Extractor for ResponseExtractor {
    fn extract(&self, raw: &str) -> String {
        extract_query(raw)
    }
}

/// Extracts a query from `raw` using the default rules.
///
/// # Examples
///
/// ```
/// use kql_ai::extract::extract_query;
///
/// let raw = "Here you go:\n```kql\nT | take 10\n```\nThis returns ten rows.";
/// assert_eq!(extract_query(raw), "T | take 10");
/// assert_eq!(extract_query("`T | count`"), "T | count");
/// ```
#[must_use]
pub fn extract_query(raw: &str) -> String {
    let raw = raw.trim();
    let blocks = fenced_blocks(raw);

    let selected = blocks
        .iter()
        .find(|b| b.tag.is_some_and(is_query_tag))
        .or_else(|| blocks.first())
        .map(|b| b.body.to_string())
        .or_else(|| capture_window(raw))
        .unwrap_or_else(|| raw.to_string());

    strip_delimiters(&selected)
}

/// Returns true when a trimmed line looks like the first line of a query.
#[must_use]
pub fn looks_like_query_start(line: &str) -> bool {
    let lower = line.to_lowercase();
    if QUERY_STARTERS.iter().any(|s| lower.starts_with(s)) {
        return true;
    }
    line.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}

/// Returns true when a trimmed line reads like an explanation.
#[must_use]
pub fn looks_like_prose(line: &str) -> bool {
    let lower = line.to_lowercase();
    PROSE_STARTERS.iter().any(|s| lower.starts_with(s))
}

fn is_query_tag(tag: &str) -> bool {
    QUERY_LANGUAGE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

#[derive(Debug)]
struct FencedBlock<'a> {
    tag: Option<&'a str>,
    body: &'a str,
}

/// Finds every closed fenced block with a non-empty body. An unclosed trailing fence is ignored.
fn fenced_blocks(text: &str) -> Vec<FencedBlock<'_>> {
    let mut blocks = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(FENCE) {
        let after_open = &rest[open + FENCE.len()..];
        let (tag, content) = split_info_string(after_open);
        let Some(close) = content.find(FENCE) else {
            break;
        };
        let body = content[..close].trim();
        if !body.is_empty() {
            blocks.push(FencedBlock { tag, body });
        }
        rest = &content[close + FENCE.len()..];
    }

    blocks
}

/// Splits a language tag off the text following an opening fence.
///
/// A tag is a run of identifier characters that ends the opening line. Known query
/// tags are also accepted when followed by a space, so ```` ```kql T | take 1``` ````
/// still yields `T | take 1`.
fn split_info_string(after_open: &str) -> (Option<&str>, &str) {
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+'))
        .unwrap_or(after_open.len());
    if tag_len == 0 {
        return (None, after_open);
    }

    let tag = &after_open[..tag_len];
    let tail = &after_open[tag_len..];
    let ends_line = tail.is_empty() || tail.starts_with('\n') || tail.starts_with("\r\n");
    let spaced_query_tag = is_query_tag(tag) && tail.starts_with([' ', '\t']);

    if ends_line || spaced_query_tag {
        (Some(tag), tail)
    } else {
        (None, after_open)
    }
}

/// Scans lines for a query-shaped window, stopping at the first line of prose.
fn capture_window(text: &str) -> Option<String> {
    let mut captured: Vec<&str> = Vec::new();
    let mut open = false;

    for line in text.lines() {
        let trimmed = line.trim();

        if !open {
            if trimmed.is_empty() || looks_like_prose(trimmed) || !looks_like_query_start(trimmed) {
                continue;
            }
            open = true;
        } else if looks_like_prose(trimmed) {
            break;
        }

        captured.push(line);
    }

    if captured.is_empty() {
        return None;
    }
    Some(captured.join("\n").trim().to_string())
}

/// Removes one surrounding pair of inline delimiters, then any lone one left at either end.
fn strip_delimiters(text: &str) -> String {
    let mut s = text.trim();

    if s.len() >= 2 && s.starts_with(DELIMITER) && s.ends_with(DELIMITER) {
        s = &s[1..s.len() - 1];
    }
    s = s.strip_prefix(DELIMITER).unwrap_or(s);
    s = s.strip_suffix(DELIMITER).unwrap_or(s);

    s.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_kql_tagged_block() {
        let raw = "```sql\nSELECT 1\n```\n\n```kql\nT | take 1\n```";
        assert_eq!(extract_query(raw), "T | take 1");
    }

    #[test]
    fn test_kusto_tag_is_recognised() {
        let raw = "```Kusto\nStormEvents | count\n```";
        assert_eq!(extract_query(raw), "StormEvents | count");
    }

    #[test]
    fn test_falls_back_to_first_untagged_block() {
        let raw = "Try this:\n```\nT | where x > 1\n```\nor\n```\nT | take 5\n```";
        assert_eq!(extract_query(raw), "T | where x > 1");
    }

    #[test]
    fn test_other_language_tag_is_dropped_from_body() {
        let raw = "```text\nT | summarize count() by State\n```";
        assert_eq!(extract_query(raw), "T | summarize count() by State");
    }

    #[test]
    fn test_single_line_fence() {
        assert_eq!(extract_query("```kql T | take 3```"), "T | take 3");
        assert_eq!(extract_query("```T | take 3```"), "T | take 3");
    }

    #[test]
    fn test_empty_fence_is_skipped() {
        let raw = "```kql\n```\n```\nT | count\n```";
        assert_eq!(extract_query(raw), "T | count");
    }

    #[test]
    fn test_line_scan_stops_at_prose() {
        let raw = "StormEvents\n| where State == 'TEXAS'\n| count\n\nThis query counts Texas events.";
        assert_eq!(
            extract_query(raw),
            "StormEvents\n| where State == 'TEXAS'\n| count"
        );
    }

    #[test]
    fn test_leading_prose_is_skipped() {
        let raw = "Here's the query:\n\nT | take 10\nNote: adjust the limit.";
        assert_eq!(extract_query(raw), "T | take 10");
    }

    #[test]
    fn test_let_statement_opens_window() {
        let raw = "\n\nlet x = 5;\nT | where v > x";
        assert_eq!(extract_query(raw), "let x = 5;\nT | where v > x");
    }

    #[test]
    fn test_comment_opens_window() {
        let raw = "// top states\nT | top 5 by Count";
        assert_eq!(extract_query(raw), "// top states\nT | top 5 by Count");
    }

    #[test]
    fn test_no_window_returns_trimmed_input() {
        assert_eq!(extract_query("   | take 10   "), "| take 10");
        assert_eq!(extract_query("123 456"), "123 456");
    }

    #[test]
    fn test_inline_delimiters_are_stripped() {
        assert_eq!(extract_query("`T | count`"), "T | count");
        assert_eq!(extract_query("`T | count"), "T | count");
        assert_eq!(extract_query("T | count`"), "T | count");
    }

    #[test]
    fn test_unclosed_fence_is_total() {
        assert_eq!(extract_query("```kql\nT | take 10"), "T | take 10");
        assert_eq!(extract_query("```"), "");
        let _ = extract_query("``````");
        let _ = extract_query("```kql\nA\n```\n```");
    }

    #[test]
    fn test_empty_and_prose_only_inputs() {
        assert_eq!(extract_query(""), "");
        assert_eq!(extract_query("   \n  "), "");
        assert_eq!(
            extract_query("This query cannot be written."),
            "This query cannot be written."
        );
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        let raw = "```kql\nT | where Name == '日本'\n```";
        assert_eq!(extract_query(raw), "T | where Name == '日本'");
        let _ = extract_query("`日`");
        let _ = extract_query("``日本``");
    }

    #[test]
    fn test_start_and_prose_rules() {
        assert!(looks_like_query_start("StormEvents"));
        assert!(looks_like_query_start("let t = 1;"));
        assert!(looks_like_query_start("/* block */"));
        assert!(!looks_like_query_start("| take 1"));
        assert!(!looks_like_query_start("1. first step"));
        assert!(looks_like_prose("Note: this is slow"));
        assert!(looks_like_prose("HERE IS the answer"));
        assert!(!looks_like_prose("T | take 1"));
    }
}
