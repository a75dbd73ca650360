//! Killzone session filter.
//!
//! Classifies a UTC timestamp into a named trading session. Sessions are
//! explicit hour sets rather than ranges so both the backtest and the live path
//! read the same definition, and asymmetric windows stay exact.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A high-liquidity trading window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    London,
    NewYork,
}

impl Session {
    pub fn name(&self) -> &'static str {
        match self {
            Self::London => "London",
            Self::NewYork => "NewYork",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Hour sets (UTC, 0..=23) that make up each session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionWindows {
    pub london: Vec<u32>,
    pub new_york: Vec<u32>,
}

impl Default for SessionWindows {
    fn default() -> Self {
        Self {
            london: vec![7, 8, 9, 10],
            new_york: vec![12, 13, 14, 15],
        }
    }
}

impl SessionWindows {
    /// Session containing `hour`, or `None` outside every killzone.
    pub fn classify_hour(&self, hour: u32) -> Option<Session> {
        if self.london.contains(&hour) {
            Some(Session::London)
        } else if self.new_york.contains(&hour) {
            Some(Session::NewYork)
        } else {
            None
        }
    }

    /// Session containing the timestamp's UTC hour.
    pub fn classify(&self, timestamp: DateTime<Utc>) -> Option<Session> {
        self.classify_hour(timestamp.hour())
    }

    /// Reject out-of-range hours and hours claimed by both sessions.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(h) = self.london.iter().chain(&self.new_york).find(|h| **h > 23) {
            return Err(format!("session hour {h} is out of range 0..=23"));
        }
        if let Some(h) = self.london.iter().find(|h| self.new_york.contains(h)) {
            return Err(format!("hour {h} belongs to both London and NewYork"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_hour_sets() {
        let windows = SessionWindows::default();
        for h in 7..=10 {
            assert_eq!(windows.classify_hour(h), Some(Session::London));
        }
        for h in 12..=15 {
            assert_eq!(windows.classify_hour(h), Some(Session::NewYork));
        }
        for h in [0, 6, 11, 16, 23] {
            assert_eq!(windows.classify_hour(h), None, "hour {h}");
        }
    }

    #[test]
    fn classify_uses_utc_hour() {
        let windows = SessionWindows::default();
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 10, 59, 59).unwrap();
        assert_eq!(windows.classify(ts), Some(Session::London));
        let ts = Utc.with_ymd_and_hms(2024, 3, 4, 11, 0, 0).unwrap();
        assert_eq!(windows.classify(ts), None);
    }

    #[test]
    fn asymmetric_sets_are_exact() {
        let windows = SessionWindows {
            london: vec![7, 9],
            new_york: vec![13],
        };
        assert_eq!(windows.classify_hour(8), None);
        assert_eq!(windows.classify_hour(9), Some(Session::London));
        assert_eq!(windows.classify_hour(12), None);
    }

    #[test]
    fn validate_rejects_overlap_and_range() {
        let overlap = SessionWindows {
            london: vec![7, 12],
            new_york: vec![12],
        };
        assert!(overlap.validate().is_err());

        let range = SessionWindows {
            london: vec![24],
            new_york: vec![],
        };
        assert!(range.validate().is_err());

        assert!(SessionWindows::default().validate().is_ok());
    }
}
