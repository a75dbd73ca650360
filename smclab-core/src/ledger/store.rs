//! JSON file persistence for the ledger.
//!
//! The whole list is read once per cycle and rewritten once. Saves go through a
//! sibling `.tmp` file and a rename so a crash never leaves a half-written ledger.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::entry::LedgerEntry;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict load. A missing file is an empty ledger, anything else unreadable is an error.
    pub fn try_load(&self) -> Result<Vec<LedgerEntry>, EngineError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(EngineError::Persistence(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| {
            EngineError::Persistence(format!("parse {}: {e}", self.path.display()))
        })
    }

    /// Load, falling back to an empty ledger when the file is unreadable or corrupt.
    pub fn load(&self) -> Vec<LedgerEntry> {
        self.try_load().unwrap_or_else(|err| {
            tracing::warn!(%err, "ledger unreadable, continuing with an empty ledger");
            Vec::new()
        })
    }

    /// Rewrite the whole ledger.
    pub fn save(&self, entries: &[LedgerEntry]) -> Result<(), EngineError> {
        let persist = |e: &dyn std::fmt::Display| {
            EngineError::Persistence(format!("write {}: {e}", self.path.display()))
        };

        let json = serde_json::to_string_pretty(entries).map_err(|e| persist(&e))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persist(&e))?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| persist(&e))?;
        fs::rename(&tmp, &self.path).map_err(|e| persist(&e))
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Direction;
    use crate::ledger::entry::{EntryResult, EntryStatus};
    use chrono::{TimeZone, Utc};

    fn sample() -> Vec<LedgerEntry> {
        let t = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();
        vec![
            LedgerEntry {
                time: t,
                direction: Direction::Short,
                entry: 99.0,
                stop: 100.5,
                target: 96.0,
                status: EntryStatus::Closed,
                result: EntryResult::Win,
                close_price: Some(96.0),
                close_time: Some(t + chrono::Duration::minutes(45)),
            },
            LedgerEntry {
                time: t + chrono::Duration::hours(1),
                direction: Direction::Long,
                entry: 106.0,
                stop: 103.5,
                target: 111.0,
                status: EntryStatus::Open,
                result: EntryResult::Pending,
                close_price: None,
                close_time: None,
            },
        ]
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("nested").join("ledger.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.try_load().unwrap(), sample());
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LedgerStore::new(dir.path().join("absent.json"));
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_recovers_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "{not json").unwrap();
        let store = LedgerStore::new(&path);
        assert!(matches!(store.try_load(), Err(EngineError::Persistence(_))));
        assert!(store.load().is_empty());
    }
}
