//! Durable key/value storage for swipe counters.
//!
//! The tracker treats persistence as an opaque string store so that tests
//! can swap in [`MemoryStore`] and apps can bridge to whatever the host
//! platform offers (UserDefaults, SharedPreferences, a plist in the app
//! container). [`FileStore`] is the implementation shipped with the SDK.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::errors::SdkError;

/// Keys the tracker persists under.
pub mod keys {
    /// Unified day stamp (`YYYY-MM-DD`, local calendar) covering every counter.
    pub const LAST_USAGE_DATE: &str = "lastUsageDate";
    /// Global swipes recorded today.
    pub const DAILY_SWIPE_COUNT: &str = "dailySwipeCount";
    /// Rewarded-ad credit balance remaining today.
    pub const REWARDED_SWIPES_REMAINING: &str = "rewardedSwipesRemaining";
    /// JSON map of filter key to swipes recorded today.
    pub const FILTER_SWIPE_COUNTS: &str = "filterSwipeCounts";
    /// RFC 3339 anchor used by the stand-in trial provider.
    pub const TRIAL_START_DATE: &str = "trialStartDate";
}

/// Opaque durable string store.
pub trait SwipeStore {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), SdkError>;
    /// Removes `key` if present.
    fn remove(&mut self, key: &str) -> Result<(), SdkError>;
}

/// JSON-file-backed store. The whole map is rewritten on every `set`,
/// which is fine at this size (a handful of short keys).
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Opens the store at `path`, creating it lazily on first write.
    /// A malformed or unreadable file is treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::debug!("swipe store file did not parse, starting empty: {err}");
                HashMap::new()
            }),
            Err(_) => HashMap::new(),
        };

        Self { path, entries }
    }

    fn flush(&self) -> Result<(), SdkError> {
        let raw =
            serde_json::to_string(&self.entries).map_err(|err| SdkError::Store(err.to_string()))?;

        fs::write(&self.path, raw).map_err(|err| SdkError::Store(err.to_string()))
    }
}

impl SwipeStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SdkError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<(), SdkError> {
        if self.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

/// In-memory store for tests and previews. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SwipeStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SdkError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SdkError> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        {
            let mut store = FileStore::open(&path);
            store.set(keys::DAILY_SWIPE_COUNT, "7").unwrap();
            store.set(keys::LAST_USAGE_DATE, "2026-08-25").unwrap();
        }

        let store = FileStore::open(&path);
        assert_eq!(store.get(keys::DAILY_SWIPE_COUNT).as_deref(), Some("7"));
        assert_eq!(store.get(keys::LAST_USAGE_DATE).as_deref(), Some("2026-08-25"));
    }

    #[test]
    fn malformed_file_is_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json at all {{{").unwrap();

        let store = FileStore::open(&path);
        assert_eq!(store.get(keys::DAILY_SWIPE_COUNT), None);
    }

    #[test]
    fn remove_deletes_the_key() {
        let mut store = MemoryStore::new();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k"), None);
    }
}
