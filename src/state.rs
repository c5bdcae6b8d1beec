//! Persisted trade record
//!
//! A single JSON object `{ previousTrade, nextTrade, count }` that survives restarts
//! so a pending run can be re-armed. Written after every scheduling decision.

use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// When the bot last traded and when it trades next
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    /// Start of the last cycle whose action succeeded
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub previous_trade: Option<DateTime<Utc>>,
    /// When the next cycle is due
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub next_trade: Option<DateTime<Utc>>,
    /// Cycles run so far; parity picks buy or sell
    #[serde(default)]
    pub count: u64,
}

/// Accept `null`, a missing field or the empty string as "not set"
fn lenient_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

/// File-backed storage for the [`TradeRecord`]
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record without touching the file.
    ///
    /// A missing file reads as a fresh record; an unreadable one is an error.
    pub async fn load(&self) -> Result<TradeRecord> {
        if !self.path.exists() {
            return Ok(TradeRecord::default());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the record, creating the file on first launch
    ///
    /// A corrupt file is logged and replaced by a fresh record. Failing to write the
    /// fresh record is logged only; the bot then runs on the in-memory record.
    pub async fn load_or_create(&self) -> Result<TradeRecord> {
        if !self.path.exists() {
            let record = TradeRecord::default();
            self.save_fresh(&record).await;
            tracing::info!(path = %self.path.display(), "Created new trade record");
            return Ok(record);
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<TradeRecord>(&content) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Trade record unreadable, starting fresh"
                );
                let record = TradeRecord::default();
                self.save_fresh(&record).await;
                Ok(record)
            }
        }
    }

    async fn save_fresh(&self, record: &TradeRecord) {
        if let Err(e) = self.save(record).await {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Could not write trade record, continuing in memory"
            );
        }
    }

    /// Overwrite the file with the given record
    pub async fn save(&self, record: &TradeRecord) -> Result<()> {
        let content = serde_json::to_string_pretty(record)?;
        tokio::fs::write(&self.path, content).await?;
        tracing::debug!(path = %self.path.display(), ?record, "Trade record stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    #[test]
    fn test_reads_legacy_empty_strings() {
        let record: TradeRecord =
            serde_json::from_str(r#"{"previousTrade":"","nextTrade":""}"#).unwrap();
        assert_eq!(record, TradeRecord::default());
    }

    #[test]
    fn test_serializes_camel_case() {
        let record = TradeRecord {
            previous_trade: None,
            next_trade: Some(Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()),
            count: 4,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["nextTrade"], "2026-10-18T12:00:00Z");
        assert_eq!(value["count"], 4);
        assert!(value["previousTrade"].is_null());

        let back: TradeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[tokio::test]
    async fn test_load_creates_missing_file() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("next.json"));

        let record = store.load_or_create().await.unwrap();
        assert_eq!(record, TradeRecord::default());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("next.json"));
        let record = TradeRecord {
            previous_trade: Some(Utc.with_ymd_and_hms(2026, 10, 17, 0, 0, 0).unwrap()),
            next_trade: Some(Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap()),
            count: 9,
        };

        store.save(&record).await.unwrap();
        assert_eq!(store.load_or_create().await.unwrap(), record);
    }

    #[tokio::test]
    async fn test_unwritable_path_falls_back_to_memory() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("missing").join("next.json"));

        let record = store.load_or_create().await.unwrap();
        assert_eq!(record, TradeRecord::default());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_load_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("next.json");
        let store = StateStore::new(&path);

        assert_eq!(store.load().await.unwrap(), TradeRecord::default());
        assert!(!path.exists());

        let legacy = r#"{"nextTrade":"Sat Oct 18 2026 GMT+0800"}"#;
        std::fs::write(&path, legacy).unwrap();
        assert!(store.load().await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), legacy);
    }

    #[tokio::test]
    async fn test_corrupt_file_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("next.json");
        std::fs::write(&path, r#"{"nextTrade":"Sat Oct 18 2026 GMT+0800"}"#).unwrap();

        let store = StateStore::new(&path);
        let record = store.load_or_create().await.unwrap();
        assert_eq!(record, TradeRecord::default());
    }
}
