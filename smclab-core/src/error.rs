//! Engine error taxonomy.
//!
//! None of these are fatal to the process. The runner maps each variant to a
//! skipped or degraded cycle and keeps going.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EngineError {
    /// Fewer bars than the feature warm-up needs. The cycle is skipped.
    #[error("insufficient data: have {have} bars, need at least {need}")]
    InsufficientData { have: usize, need: usize },

    /// Entry and stop coincide, so the signal has no risk unit and is discarded.
    #[error("degenerate signal: entry {entry} equals stop {stop}")]
    DegenerateSignal { entry: f64, stop: f64 },

    /// Parameters the computation cannot run with, such as a zero window.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// Ledger could not be read or written. Callers fall back to an empty ledger.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Bar or notification source failed. No state is mutated for the cycle.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl EngineError {
    /// True for errors after which the caller should simply skip this cycle.
    pub fn skips_cycle(&self) -> bool {
        matches!(
            self,
            Self::InsufficientData { .. } | Self::UpstreamUnavailable(_)
        )
    }
}
