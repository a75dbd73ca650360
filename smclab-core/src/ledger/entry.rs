//! Persisted live-trade records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, Direction, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryResult {
    Pending,
    Win,
    Loss,
}

/// One accepted live signal and, once closed, how it ended.
///
/// Field names on disk follow the ledger file layout: `type`, `sl`, `tp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub entry: f64,
    #[serde(rename = "sl")]
    pub stop: f64,
    #[serde(rename = "tp")]
    pub target: f64,
    pub status: EntryStatus,
    pub result: EntryResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<DateTime<Utc>>,
}

impl LedgerEntry {
    pub fn from_signal(signal: &Signal) -> Self {
        Self {
            time: signal.time,
            direction: signal.direction,
            entry: signal.entry,
            stop: signal.stop,
            target: signal.target,
            status: EntryStatus::Open,
            result: EntryResult::Pending,
            close_price: None,
            close_time: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == EntryStatus::Open
    }

    pub fn is_closed_with(&self, result: EntryResult) -> bool {
        self.status == EntryStatus::Closed && self.result == result
    }

    /// Outcome this bar would force on the entry. Target is tested before stop.
    pub fn outcome_on(&self, bar: &Bar) -> Option<EntryResult> {
        let (target_hit, stop_hit) = match self.direction {
            Direction::Long => (bar.high >= self.target, bar.low <= self.stop),
            Direction::Short => (bar.low <= self.target, bar.high >= self.stop),
        };
        if target_hit {
            Some(EntryResult::Win)
        } else if stop_hit {
            Some(EntryResult::Loss)
        } else {
            None
        }
    }

    /// Close at the level that was touched. No-op on an already closed entry.
    pub(crate) fn close(&mut self, result: EntryResult, at: DateTime<Utc>) -> bool {
        if !self.is_open() || result == EntryResult::Pending {
            return false;
        }
        self.status = EntryStatus::Closed;
        self.result = result;
        self.close_price = Some(match result {
            EntryResult::Win => self.target,
            _ => self.stop,
        });
        self.close_time = Some(at);
        true
    }
}
