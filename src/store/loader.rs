use tracing::{info, warn};

use super::naming::{is_record_key, list_prefix};
use super::{RecordStore, StoreError};
use crate::tally::VoteRecord;

/// A parsed vote record together with the key it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub record: VoteRecord,
}

/// Why a single stored object was skipped during loading.
#[derive(Debug, thiserror::Error)]
pub enum MalformedRecord {
    #[error("fetch failed: {0}")]
    Fetch(#[from] StoreError),

    #[error("not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    #[error("not a vote record: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Loads every vote record stored under `prefix`.
///
/// Objects that cannot be fetched or parsed are logged and skipped. Only a
/// failure to list the namespace is returned as an error. The result is
/// sorted by key, so equal-timestamp ties resolve the same way every run.
#[tracing::instrument(skip(store))]
pub async fn load_all<S>(store: &S, prefix: &str) -> Result<Vec<StoredRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    let mut keys: Vec<String> = store
        .list_keys(&list_prefix(prefix))
        .await?
        .into_iter()
        .filter(|key| is_record_key(key))
        .collect();
    keys.sort();

    let mut records = Vec::with_capacity(keys.len());
    let mut skipped = 0usize;

    for key in keys {
        match fetch_record(store, &key).await {
            Ok(record) => records.push(StoredRecord { key, record }),
            Err(e) => {
                skipped += 1;
                warn!(key = %key, error = %e, "Skipping malformed vote record");
            }
        }
    }

    info!(loaded = records.len(), skipped, "Vote records loaded");
    Ok(records)
}

/// Like [`load_all`] but drops the keys.
pub async fn load_records<S>(store: &S, prefix: &str) -> Result<Vec<VoteRecord>, StoreError>
where
    S: RecordStore + ?Sized,
{
    Ok(load_all(store, prefix)
        .await?
        .into_iter()
        .map(|stored| stored.record)
        .collect())
}

async fn fetch_record<S>(store: &S, key: &str) -> Result<VoteRecord, MalformedRecord>
where
    S: RecordStore + ?Sized,
{
    let bytes = store.get(key).await?;
    let text = std::str::from_utf8(&bytes)?;
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryRecordStore, WriteMode};
    use bytes::Bytes;

    struct UnreachableStore;

    #[async_trait::async_trait]
    impl RecordStore for UnreachableStore {
        async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }

        async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
            Err(StoreError::NotFound {
                key: key.to_string(),
            })
        }

        async fn put(&self, _key: &str, _body: Bytes, _mode: WriteMode) -> Result<(), StoreError> {
            Err(StoreError::unavailable("connection refused"))
        }
    }

    async fn seed(store: &MemoryRecordStore, key: &str, body: &'static [u8]) {
        store
            .put(key, Bytes::from_static(body), WriteMode::Create)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_namespace_loads_nothing() {
        let store = MemoryRecordStore::new();
        let records = load_all(&store, "vote_results").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_records_are_skipped() {
        let store = MemoryRecordStore::new();
        seed(
            &store,
            "vote_results/J1_a.json",
            br#"{"judgeId":"J1","results":[]}"#,
        )
        .await;
        seed(&store, "vote_results/J2_b.json", b"{ truncated").await;
        seed(&store, "vote_results/J3_c.json", &[0xff, 0xfe, 0x00]).await;
        seed(&store, "vote_results/J4_d.json", br#"{"judgeId":"J4","results":7}"#).await;

        let records = load_all(&store, "vote_results").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].key, "vote_results/J1_a.json");
        assert_eq!(records[0].record.judge_id.as_deref(), Some("J1"));
    }

    #[tokio::test]
    async fn test_only_json_objects_under_prefix_are_loaded() {
        let store = MemoryRecordStore::new();
        seed(&store, "vote_results/J1_a.json", br#"{"judgeId":"J1"}"#).await;
        seed(&store, "vote_results/readme.txt", b"hello").await;
        seed(&store, "leaderboard/latest.json", br#"{"judgeId":"X"}"#).await;

        let records = load_records(&store, "vote_results").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].judge_id.as_deref(), Some("J1"));
    }

    #[tokio::test]
    async fn test_records_are_sorted_by_key() {
        let store = MemoryRecordStore::new();
        seed(&store, "v/c.json", br#"{"judgeId":"C"}"#).await;
        seed(&store, "v/a.json", br#"{"judgeId":"A"}"#).await;
        seed(&store, "v/b.json", br#"{"judgeId":"B"}"#).await;

        let keys: Vec<_> = load_all(&store, "v")
            .await
            .unwrap()
            .into_iter()
            .map(|stored| stored.key)
            .collect();

        assert_eq!(keys, vec!["v/a.json", "v/b.json", "v/c.json"]);
    }

    #[tokio::test]
    async fn test_listing_failure_is_an_error() {
        let err = load_all(&UnreachableStore, "vote_results").await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
