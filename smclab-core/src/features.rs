//! Feature computer — trend, volatility and momentum features per bar.

use serde::{Deserialize, Serialize};

use crate::domain::Bar;
use crate::error::EngineError;
use crate::indicators::{true_range, Atr, Indicator, Sma};
use crate::params::StrategyParams;

/// Features aligned 1:1 with a bar series.
///
/// `trend` is undefined for the first `trend_window - 1` bars, `true_range` on
/// the first bar, `atr` for the first `atr_window` bars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub trend: Vec<Option<f64>>,
    pub true_range: Vec<Option<f64>>,
    pub atr: Vec<Option<f64>>,
    pub body_size: Vec<f64>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.body_size.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body_size.is_empty()
    }

    pub fn trend_at(&self, i: usize) -> Option<f64> {
        self.trend.get(i).copied().flatten()
    }

    pub fn atr_at(&self, i: usize) -> Option<f64> {
        self.atr.get(i).copied().flatten()
    }

    /// Index of the first bar where every feature is defined.
    pub fn first_complete_index(&self) -> Option<usize> {
        (0..self.len()).find(|&i| self.trend_at(i).is_some() && self.atr_at(i).is_some())
    }
}

/// Compute features for the whole series.
///
/// Fails with `InvalidParams` on a zero window and with `InsufficientData`
/// when the series is shorter than `max(trend_window, atr_window) + 1`.
pub fn compute_features(bars: &[Bar], params: &StrategyParams) -> Result<FeatureSet, EngineError> {
    if params.trend_window == 0 || params.atr_window == 0 {
        return Err(EngineError::InvalidParams(format!(
            "trend_window {} and atr_window {} must be >= 1",
            params.trend_window, params.atr_window
        )));
    }
    let need = params.required_bars();
    if bars.len() < need {
        return Err(EngineError::InsufficientData {
            have: bars.len(),
            need,
        });
    }

    let true_range = true_range(bars);
    let atr = Atr::new(params.atr_window).compute(bars);
    let trend = Sma::new(params.trend_window).compute(bars);
    let body_size = bars.iter().map(Bar::body_size).collect();

    Ok(FeatureSet {
        trend,
        true_range,
        atr,
        body_size,
    })
}
