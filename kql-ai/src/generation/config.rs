//! Configuration for validation and retry behavior.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Policy for one generate-validate-repair run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Validate candidates at all (default: true). When false a single unvalidated attempt is made.
    pub enabled: bool,
    /// Treat a still-invalid result as a hard failure at the caller (default: false).
    pub strict: bool,
    /// Retry attempts beyond the first (default: 2).
    pub retries: usize,
    /// What goes into retry prompts.
    pub feedback: FeedbackConfig,
    /// How temperature moves across attempts.
    pub temperature: TempAdjustConfig,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            strict: false,
            retries: 2,
            feedback: FeedbackConfig::default(),
            temperature: TempAdjustConfig::default(),
        }
    }
}

impl ValidationConfig {
    /// Total generation calls allowed.
    #[must_use]
    pub const fn max_attempts(&self) -> usize {
        self.retries.saturating_add(1)
    }

    /// Set the number of retries.
    #[must_use]
    pub const fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    /// Set strict mode.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Enable or disable validation.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Replace the feedback policy.
    #[must_use]
    pub const fn with_feedback(mut self, feedback: FeedbackConfig) -> Self {
        self.feedback = feedback;
        self
    }

    /// Replace the temperature policy.
    #[must_use]
    pub const fn with_temperature(mut self, temperature: TempAdjustConfig) -> Self {
        self.temperature = temperature;
        self
    }

    /// Apply a named preset on top of the current values.
    pub const fn apply_preset(&mut self, preset: Preset) {
        match preset {
            Preset::Minimal => {
                self.retries = 0;
                self.feedback.hints = false;
                self.feedback.examples = false;
            }
            Preset::Balanced => {}
            Preset::Thorough => {
                self.retries = 5;
                self.feedback.progressive = true;
            }
            Preset::Strict => {
                self.strict = true;
                self.retries = 3;
            }
        }
    }
}

/// Which feedback sections retry prompts carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct FeedbackConfig {
    /// Positioned diagnostics from the failed attempt.
    pub errors: bool,
    /// Hints derived from the diagnostics.
    pub hints: bool,
    /// Syntax examples derived from the diagnostics.
    pub examples: bool,
    /// Escalate emphasis from the third attempt on.
    pub progressive: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            errors: true,
            hints: true,
            examples: true,
            progressive: false,
        }
    }
}

impl FeedbackConfig {
    /// Every section switched off.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            errors: false,
            hints: false,
            examples: false,
            progressive: false,
        }
    }

    /// Every section switched on.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            errors: true,
            hints: true,
            examples: true,
            progressive: true,
        }
    }
}

/// Temperature escalation across retries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempAdjustConfig {
    /// Raise temperature on retries (default: true).
    pub adjust: bool,
    /// Added per retry (default: 0.1).
    pub increment: f32,
    /// Ceiling (default: 0.5).
    pub max: f32,
}

impl Default for TempAdjustConfig {
    fn default() -> Self {
        Self {
            adjust: true,
            increment: 0.1,
            max: 0.5,
        }
    }
}

/// Named bundles of validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// No retries, errors-only feedback.
    Minimal,
    /// The defaults.
    Balanced,
    /// Five retries with progressive feedback.
    Thorough,
    /// Strict mode with three retries.
    Strict,
}

impl Preset {
    /// All presets, in documentation order.
    pub const ALL: [Self; 4] = [Self::Minimal, Self::Balanced, Self::Thorough, Self::Strict];

    /// Lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Strict => "strict",
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!("unknown preset {s:?} (expected minimal, balanced, thorough, strict)")
            })
    }
}
