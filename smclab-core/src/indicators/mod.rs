//! Indicator implementations feeding the feature computer.
//!
//! Indicators are pure functions: bar history in, a series of the same length
//! out. Positions inside the warm-up window are `None`. Moving averages here are
//! unweighted trailing means, never exponential.

pub mod atr;
pub mod sma;

pub use atr::{true_range, Atr};
pub use sma::{rolling_mean, Sma};

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead guard
/// No value at bar t may depend on bar t+1 or later. Truncating the series must
/// leave every earlier value unchanged.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_200", "atr_14").
    fn name(&self) -> &str;

    /// Index of the first defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the whole series. Output length equals `bars.len()`.
    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>>;
}

/// Create synthetic 15-minute bars from close prices for testing.
///
/// open = prev_close (or close for the first bar), high = max(open,close) + 1.0,
/// low = min(open,close) - 1.0.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    use chrono::TimeZone;
    let base = chrono::Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                timestamp: base + chrono::Duration::minutes(15 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
