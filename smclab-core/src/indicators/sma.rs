//! Simple Moving Average (SMA).
//!
//! Rolling mean of close prices over a trailing window.
//! Lookback: period - 1 (first defined value at index period-1).

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }
}

/// Trailing unweighted mean over `period` values.
///
/// A window containing any undefined (or NaN) input yields `None`.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut missing = 0usize;
    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) if !v.is_nan() => sum += v,
            _ => missing += 1,
        }
        if i >= period {
            match values[i - period] {
                Some(v) if !v.is_nan() => sum -= v,
                _ => missing -= 1,
            }
        }
        if i + 1 >= period && missing == 0 {
            result[i] = Some(sum / period as f64);
        }
    }

    result
}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let closes: Vec<Option<f64>> = bars.iter().map(|b| Some(b.close)).collect();
        rolling_mean(&closes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn sma_5_basic() {
        let bars = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0]);
        let result = Sma::new(5).compute(&bars);

        assert_eq!(result.len(), 7);
        for (i, v) in result.iter().take(4).enumerate() {
            assert!(v.is_none(), "expected None at index {i}");
        }
        // SMA[4] = mean(10,11,12,13,14) = 12.0
        assert_approx(result[4].unwrap(), 12.0, DEFAULT_EPSILON);
        assert_approx(result[5].unwrap(), 13.0, DEFAULT_EPSILON);
        assert_approx(result[6].unwrap(), 14.0, DEFAULT_EPSILON);
    }

    #[test]
    fn sma_1_is_close() {
        let bars = make_bars(&[100.0, 200.0, 300.0]);
        let result = Sma::new(1).compute(&bars);
        assert_eq!(result, vec![Some(100.0), Some(200.0), Some(300.0)]);
    }

    #[test]
    fn gaps_in_input_poison_their_windows() {
        let values = vec![Some(1.0), None, Some(3.0), Some(5.0), Some(7.0)];
        let result = rolling_mean(&values, 2);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], None); // window [None, 3]
        assert_eq!(result[3], Some(4.0));
        assert_eq!(result[4], Some(6.0));
    }

    #[test]
    fn nan_counts_as_missing() {
        let values = vec![Some(1.0), Some(f64::NAN), Some(3.0), Some(5.0)];
        let result = rolling_mean(&values, 2);
        assert_eq!(result[1], None);
        assert_eq!(result[2], None);
        assert_eq!(result[3], Some(4.0));
    }

    #[test]
    fn sma_lookback() {
        assert_eq!(Sma::new(200).lookback(), 199);
        assert_eq!(Sma::new(1).lookback(), 0);
    }

    #[test]
    fn sma_too_few_bars() {
        let bars = make_bars(&[10.0, 11.0]);
        assert!(Sma::new(5).compute(&bars).iter().all(|v| v.is_none()));
    }
}
