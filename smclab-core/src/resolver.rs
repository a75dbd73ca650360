//! Signal resolver — turns gaps into entry/stop/target signals.
//!
//! Two modes:
//! - Backtest: a [`GapBook`] holds every detected gap; each bar is matched
//!   against the live gaps oldest-first and the first hit is consumed.
//! - Live: [`resolve_latest`] qualifies only the newest closed bar and fires
//!   immediately. Older unfilled gaps are never re-tested in this mode.

use crate::domain::{Bar, Direction, FairValueGap, GapKind, Signal};
use crate::error::EngineError;
use crate::features::FeatureSet;
use crate::gates::{qualify, Candidate, Rejection};
use crate::params::StrategyParams;

/// Build the signal for a gap touched at `bar_index`.
///
/// Entry at the near edge, stop `sl_padding_atr * atr` beyond the far edge.
fn signal_from_gap(
    gap: &FairValueGap,
    bar: &Bar,
    bar_index: usize,
    atr: f64,
    params: &StrategyParams,
) -> Result<Signal, EngineError> {
    let padding = params.sl_padding_atr * atr;
    let (direction, stop) = match gap.kind {
        GapKind::Bullish => (Direction::Long, gap.far_edge() - padding),
        GapKind::Bearish => (Direction::Short, gap.far_edge() + padding),
    };
    Signal::new(
        direction,
        gap.near_edge(),
        stop,
        params.target_rr,
        bar.timestamp,
        gap.session,
        atr,
        bar_index,
    )
}

/// Ordered queue of detected gaps for backtest matching.
#[derive(Debug, Clone)]
pub struct GapBook {
    gaps: Vec<FairValueGap>,
    max_age: usize,
}

impl GapBook {
    /// Gaps must be in creation order, as the detector returns them.
    pub fn new(gaps: Vec<FairValueGap>, max_age: usize) -> Self {
        debug_assert!(gaps.windows(2).all(|w| w[0].created_at <= w[1].created_at));
        Self { gaps, max_age }
    }

    pub fn gaps(&self) -> &[FairValueGap] {
        &self.gaps
    }

    pub fn into_gaps(self) -> Vec<FairValueGap> {
        self.gaps
    }

    pub fn mitigated_count(&self) -> usize {
        self.gaps.iter().filter(|g| g.mitigated).count()
    }

    /// Gaps that could still match at `bar_index`.
    pub fn live_count(&self, bar_index: usize) -> usize {
        self.gaps
            .iter()
            .filter(|g| g.is_live(bar_index, self.max_age))
            .count()
    }

    /// Match bar `bar_index` against the live gaps, oldest first.
    ///
    /// The first triggered gap is marked mitigated and its signal returned;
    /// later gaps are not examined for this bar. A degenerate signal still
    /// consumes its gap. Returns `None` when nothing triggers or ATR is undefined.
    pub fn resolve(
        &mut self,
        bars: &[Bar],
        features: &FeatureSet,
        bar_index: usize,
        params: &StrategyParams,
    ) -> Option<Result<Signal, EngineError>> {
        let bar = bars.get(bar_index)?;
        let atr = features.atr_at(bar_index)?;
        let max_age = self.max_age;

        let gap = self
            .gaps
            .iter_mut()
            .take_while(|g| g.created_at < bar_index)
            .find(|g| g.is_live(bar_index, max_age) && g.is_triggered_by(bar))?;

        gap.mitigate();
        Some(signal_from_gap(gap, bar, bar_index, atr, params))
    }
}

/// Result of evaluating the newest closed bar in live mode.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvaluation {
    Signal(Signal),
    Rejected(Rejection),
    Discarded(EngineError),
}

/// Qualify the last bar of `closed_bars` and emit its signal immediately.
///
/// `closed_bars` must exclude the still-forming bar; only its final element
/// and the two bars before it are inspected.
pub fn resolve_latest(
    closed_bars: &[Bar],
    features: &FeatureSet,
    params: &StrategyParams,
) -> LiveEvaluation {
    let Some(index) = closed_bars.len().checked_sub(1) else {
        return LiveEvaluation::Rejected(Rejection::InsufficientHistory);
    };
    let candidate = Candidate {
        bars: closed_bars,
        features,
        index,
        params,
    };
    let gap = match qualify(&candidate) {
        Ok(gap) => gap,
        Err(reason) => return LiveEvaluation::Rejected(reason),
    };
    let Some(atr) = features.atr_at(index) else {
        return LiveEvaluation::Rejected(Rejection::FeaturesUndefined);
    };
    match signal_from_gap(&gap, &closed_bars[index], index, atr, params) {
        Ok(signal) => LiveEvaluation::Signal(signal),
        Err(err) => LiveEvaluation::Discarded(err),
    }
}
