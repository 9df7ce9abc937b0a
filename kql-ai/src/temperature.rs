//! Per-attempt sampling temperature.

use crate::generation::config::TempAdjustConfig;

/// Temperature for `attempt` (1-based).
///
/// The first attempt always uses `base`. Later attempts raise it by
/// `increment` per retry, capped at `max`, when adjustment is enabled.
///
/// # Examples
///
/// ```
/// use kql_ai::generation::TempAdjustConfig;
/// use kql_ai::temperature::temperature;
///
/// let cfg = TempAdjustConfig { adjust: true, increment: 0.1, max: 0.5 };
/// assert!((temperature(0.2, 1, &cfg) - 0.2).abs() < 1e-6);
/// assert!((temperature(0.2, 3, &cfg) - 0.4).abs() < 1e-6);
/// assert!((temperature(0.2, 9, &cfg) - 0.5).abs() < 1e-6);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn temperature(base: f32, attempt: usize, config: &TempAdjustConfig) -> f32 {
    if attempt <= 1 || !config.adjust {
        return base;
    }
    let retries = (attempt - 1) as f32;
    (retries.mul_add(config.increment, base)).min(config.max)
}
