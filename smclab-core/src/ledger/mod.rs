//! Risk ledger — durable record of live signals, adaptive sizing and the
//! daily circuit breaker.
//!
//! The ledger is the single writer of its entries. Entries are appended on
//! acceptance and only their status, result and close fields change afterwards.

mod entry;
mod policy;
mod store;

pub use entry::{EntryResult, EntryStatus, LedgerEntry};
pub use policy::{risk_tier, stats, LedgerStats, RiskTier, DAILY_LOSS_LIMIT};
pub use store::LedgerStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction, Signal};

/// An entry closed by a bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    /// Position in the ledger.
    pub index: usize,
    pub direction: Direction,
    pub entry: f64,
    pub result: EntryResult,
    pub close_price: f64,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RiskLedger {
    entries: Vec<LedgerEntry>,
}

impl RiskLedger {
    pub fn new(entries: Vec<LedgerEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<LedgerEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_open()).count()
    }

    /// True when a signal stamped `time` was already recorded.
    pub fn has_signal_at(&self, time: DateTime<Utc>) -> bool {
        self.entries.iter().rev().any(|e| e.time == time)
    }

    /// Close every open entry whose target or stop this bar touched.
    ///
    /// Entries stamped at or after the bar's own timestamp are left alone: a
    /// bar cannot settle a signal it produced.
    pub fn resolve_open(&mut self, bar: &Bar) -> Vec<Resolution> {
        let mut resolved = Vec::new();
        for (index, e) in self.entries.iter_mut().enumerate() {
            if !e.is_open() || e.time >= bar.timestamp {
                continue;
            }
            let Some(result) = e.outcome_on(bar) else {
                continue;
            };
            if e.close(result, bar.timestamp) {
                resolved.push(Resolution {
                    index,
                    direction: e.direction,
                    entry: e.entry,
                    result,
                    close_price: e.close_price.unwrap_or(e.entry),
                    opened_at: e.time,
                    closed_at: bar.timestamp,
                });
            }
        }
        resolved
    }

    pub fn stats(&self, now: DateTime<Utc>) -> LedgerStats {
        stats(&self.entries, now)
    }

    pub fn risk_tier(&self, now: DateTime<Utc>) -> RiskTier {
        risk_tier(&self.stats(now))
    }

    /// Record an accepted signal as OPEN/PENDING.
    pub fn accept_signal(&mut self, signal: &Signal) -> &LedgerEntry {
        self.entries.push(LedgerEntry::from_signal(signal));
        &self.entries[self.entries.len() - 1]
    }
}
