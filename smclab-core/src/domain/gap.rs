//! Fair value gap records and their mitigation lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bar::Bar;
use crate::session::Session;

/// Side of the displacement that left the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapKind {
    Bullish,
    Bearish,
}

/// A three-bar displacement gap.
///
/// `top > bottom` always holds. For a bullish gap `top` is the low of the
/// displacement bar and `bottom` the high two bars earlier; for a bearish gap
/// `top` is the low two bars earlier and `bottom` the high of the displacement bar.
///
/// `mitigated` flips to true exactly once, when a signal consumes the gap.
/// Staleness is derived from age and never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FairValueGap {
    pub kind: GapKind,
    pub top: f64,
    pub bottom: f64,
    /// Bar index of the displacement bar.
    pub created_at: usize,
    pub created_time: DateTime<Utc>,
    pub session: Session,
    pub mitigated: bool,
}

impl FairValueGap {
    /// Number of bars between creation and `bar_index`.
    pub fn age_at(&self, bar_index: usize) -> usize {
        bar_index.saturating_sub(self.created_at)
    }

    /// Older than the staleness horizon at `bar_index`.
    pub fn is_stale(&self, bar_index: usize, max_age: usize) -> bool {
        self.age_at(bar_index) > max_age
    }

    /// Can still be matched at `bar_index`: created strictly earlier,
    /// unmitigated, and within the staleness horizon.
    pub fn is_live(&self, bar_index: usize, max_age: usize) -> bool {
        self.created_at < bar_index && !self.mitigated && !self.is_stale(bar_index, max_age)
    }

    /// Price re-entered the gap on `bar`.
    pub fn is_triggered_by(&self, bar: &Bar) -> bool {
        match self.kind {
            GapKind::Bullish => bar.low <= self.top,
            GapKind::Bearish => bar.high >= self.bottom,
        }
    }

    /// Near edge: the price first reached on a retrace into the gap.
    pub fn near_edge(&self) -> f64 {
        match self.kind {
            GapKind::Bullish => self.top,
            GapKind::Bearish => self.bottom,
        }
    }

    /// Far edge: the side a protective stop sits beyond.
    pub fn far_edge(&self) -> f64 {
        match self.kind {
            GapKind::Bullish => self.bottom,
            GapKind::Bearish => self.top,
        }
    }

    /// Mark the gap consumed. Returns false if it already was.
    pub fn mitigate(&mut self) -> bool {
        if self.mitigated {
            return false;
        }
        self.mitigated = true;
        true
    }
}
