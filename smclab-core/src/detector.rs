//! FVG detector — scans a series for trend-aligned displacement gaps.
//!
//! The detector is pure: for a fixed series and feature set it returns the same
//! gaps in the same (creation) order, all unmitigated. Mitigation belongs to the
//! signal resolver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{Bar, FairValueGap};
use crate::features::FeatureSet;
use crate::gates::{qualify, Candidate, Rejection};
use crate::params::StrategyParams;

/// Gaps found by a scan plus a tally of why other bars were skipped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub gaps: Vec<FairValueGap>,
    pub rejections: BTreeMap<Rejection, usize>,
}

impl DetectionReport {
    pub fn rejected(&self, reason: Rejection) -> usize {
        self.rejections.get(&reason).copied().unwrap_or(0)
    }

    pub fn candidates_scanned(&self) -> usize {
        self.gaps.len() + self.rejections.values().sum::<usize>()
    }
}

/// Scan bars `2..len - tail_bars`.
///
/// `tail_bars` reserves future bars after the last candidate; the backtest
/// passes `detect_tail_bars` so every gap has room to be mitigated.
pub fn detect_gaps(
    bars: &[Bar],
    features: &FeatureSet,
    params: &StrategyParams,
    tail_bars: usize,
) -> DetectionReport {
    let mut report = DetectionReport::default();
    let end = bars.len().saturating_sub(tail_bars).min(features.len());

    for index in 2..end {
        let candidate = Candidate {
            bars,
            features,
            index,
            params,
        };
        match qualify(&candidate) {
            Ok(gap) => report.gaps.push(gap),
            Err(reason) => *report.rejections.entry(reason).or_insert(0) += 1,
        }
    }

    report
}
