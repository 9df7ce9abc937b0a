//! Metrics tracking and token estimation for generation runs.

use std::time::Duration;

/// Metrics collected during a generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationMetrics {
    /// Total number of provider calls made.
    pub total_attempts: usize,
    /// Wall-clock time elapsed during the run.
    pub wall_time: Duration,
    /// Estimated input tokens sent across all attempts.
    pub estimated_input_tokens: usize,
    /// Estimated output tokens received across all attempts.
    pub estimated_output_tokens: usize,
}

/// Estimate token count from text using the standard 4-chars-per-token heuristic.
///
/// Counts chars rather than bytes and rounds up.
///
/// # Examples
///
/// ```
/// use kql_ai::generation::estimate_tokens;
///
/// assert_eq!(estimate_tokens("hello"), 2);
/// assert_eq!(estimate_tokens("T | take 10"), 3);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Accumulates character counts across attempts.
#[derive(Debug, Default)]
pub(crate) struct TokenTally {
    input_chars: usize,
    output_chars: usize,
}

impl TokenTally {
    pub(crate) fn record(&mut self, prompt: &str, response: &str) {
        self.input_chars += prompt.chars().count();
        self.output_chars += response.chars().count();
    }

    pub(crate) const fn finish(&self, total_attempts: usize, wall_time: Duration) -> GenerationMetrics {
        GenerationMetrics {
            total_attempts,
            wall_time,
            estimated_input_tokens: self.input_chars.div_ceil(4),
            estimated_output_tokens: self.output_chars.div_ceil(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn test_estimate_tokens_utf8() {
        assert_eq!(estimate_tokens("你好"), 1);
        assert_eq!(estimate_tokens("where 世界"), 2);
    }

    #[test]
    fn test_tally_sums_attempts() {
        let mut tally = TokenTally::default();
        tally.record("abcd", "ab");
        tally.record("abcde", "abc");
        let m = tally.finish(2, Duration::from_millis(5));
        assert_eq!(m.total_attempts, 2);
        assert_eq!(m.estimated_input_tokens, 3);
        assert_eq!(m.estimated_output_tokens, 2);
    }
}
