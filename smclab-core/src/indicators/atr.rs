//! Average True Range (ATR).
//!
//! True Range: max(high - low, |high - prev_close|). The first bar has no
//! previous close, so its true range is undefined.
//! ATR is the simple mean of true range over `period` bars.
//! Lookback: period (first defined value at index period).

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True range series. `None` on the first bar.
pub fn true_range(bars: &[Bar]) -> Vec<Option<f64>> {
    let mut tr = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            tr.push(None);
            continue;
        }
        let prev_close = bars[i - 1].close;
        tr.push(Some((bar.high - bar.low).max((bar.high - prev_close).abs())));
    }
    tr
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        rolling_mean(&true_range(bars), self.period)
    }
}
