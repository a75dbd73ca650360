//! Bar — the fundamental market data unit.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument, stamped with its open time in UTC.
///
/// A series is a slice of bars with unique, strictly increasing timestamps.
/// Bars are addressed by position (`bars[i]`) or by timestamp via [`position_of`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Absolute size of the candle body.
    pub fn body_size(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// UTC hour of day (0..=23) of the bar's open time.
    pub fn utc_hour(&self) -> u32 {
        self.timestamp.hour()
    }

    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high is the top of the range, low the bottom.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Locate a bar by timestamp. Requires the series to be sorted ascending.
pub fn position_of(bars: &[Bar], timestamp: DateTime<Utc>) -> Option<usize> {
    bars.binary_search_by(|b| b.timestamp.cmp(&timestamp)).ok()
}

/// True when timestamps are unique and strictly increasing.
pub fn is_strictly_increasing(bars: &[Bar]) -> bool {
    bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
}
