use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};

/// Key prefix for a whole organization's result list
pub const ORG_RESULTS_PREFIX: &str = "org_results_";

/// Key prefix for a per-indicator monthly map
pub const MONTHLY_RESULTS_PREFIX: &str = "monthly_results_";

/// Key prefix for a single saved result row (offline recovery)
pub const RECORD_PREFIX: &str = "indicator_result_";

pub fn org_results_key(org_code: &str) -> String {
    format!("{}{}", ORG_RESULTS_PREFIX, org_code)
}

pub fn monthly_results_key(org_code: &str, indicator_id: &str) -> String {
    format!("{}{}_{}", MONTHLY_RESULTS_PREFIX, org_code, indicator_id)
}

pub fn record_key(org_code: &str, indicator_id: &str, month: &str) -> String {
    format!("{}{}_{}_{}", RECORD_PREFIX, org_code, indicator_id, month)
}

/// Split a record key back into (org_code, indicator_id, month).
///
/// Keys assume codes and ids carry no underscore of their own, which
/// holds for the sheet's key columns.
pub fn parse_record_key(key: &str) -> Option<(&str, &str, &str)> {
    let rest = key.strip_prefix(RECORD_PREFIX)?;
    let (rest, month) = rest.rsplit_once('_')?;
    let (org_code, indicator_id) = rest.split_once('_')?;
    if org_code.is_empty() || indicator_id.is_empty() || month.is_empty() {
        return None;
    }
    Some((org_code, indicator_id, month))
}

/// Durable key-value store backing the result cache.
///
/// One JSON file per key in the cache directory, mirroring the web
/// dashboard's localStorage entries so either client can recover the
/// other's saves. Writes are best-effort; the remote repository stays
/// authoritative.
pub struct LocalStore {
    store_dir: PathBuf,
}

impl LocalStore {
    pub fn new(store_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&store_dir)
            .with_context(|| format!("Failed to create store directory {}", store_dir.display()))?;
        Ok(Self { store_dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.store_dir.join(format!("{}.json", key))
    }

    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read store entry: {}", key))?;
        let value: T = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store entry: {}", key))?;
        Ok(Some(value))
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.entry_path(key);
        let contents = serde_json::to_string_pretty(value)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write store entry: {}", key))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove store entry: {}", key))?;
        }
        Ok(())
    }

    /// All entry keys currently on disk, in no particular order
    pub fn keys(&self) -> Vec<String> {
        let entries = match std::fs::read_dir(&self.store_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name();
                let name = name.to_str()?;
                Some(name.strip_suffix(".json")?.to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonthlyResults, ResultValue};

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_key_formats() {
        assert_eq!(org_results_key("ORG1"), "org_results_ORG1");
        assert_eq!(monthly_results_key("ORG1", "IND1"), "monthly_results_ORG1_IND1");
        assert_eq!(record_key("ORG1", "IND1", "4"), "indicator_result_ORG1_IND1_4");
    }

    #[test]
    fn test_parse_record_key() {
        assert_eq!(
            parse_record_key("indicator_result_ORG1_IND1_4"),
            Some(("ORG1", "IND1", "4"))
        );
        assert_eq!(parse_record_key("indicator_result_ORG1"), None);
        assert_eq!(parse_record_key("org_results_ORG1"), None);
    }

    #[test]
    fn test_save_load_remove_round_trip() {
        let (_dir, store) = store();
        let mut map = MonthlyResults::default();
        map.set(4, ResultValue::Fulfilled);

        let key = monthly_results_key("ORG1", "IND1");
        store.save(&key, &map).unwrap();

        let loaded: Option<MonthlyResults> = store.load(&key).unwrap();
        assert_eq!(loaded, Some(map));

        store.remove(&key).unwrap();
        let gone: Option<MonthlyResults> = store.load(&key).unwrap();
        assert!(gone.is_none());
    }

    #[test]
    fn test_load_missing_is_none() {
        let (_dir, store) = store();
        let loaded: Option<MonthlyResults> = store.load("org_results_NOPE").unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_malformed_is_error_not_panic() {
        let (dir, store) = store();
        std::fs::write(dir.path().join("org_results_BAD.json"), "{not json").unwrap();
        let loaded: Result<Option<MonthlyResults>> = store.load("org_results_BAD");
        assert!(loaded.is_err());
    }

    #[test]
    fn test_keys_lists_entries() {
        let (_dir, store) = store();
        store.save("org_results_ORG1", &Vec::<u8>::new()).unwrap();
        store.save("monthly_results_ORG1_IND1", &Vec::<u8>::new()).unwrap();

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["monthly_results_ORG1_IND1", "org_results_ORG1"]);
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let (_dir, store) = store();
        assert!(store.remove("org_results_NOPE").is_ok());
    }
}
