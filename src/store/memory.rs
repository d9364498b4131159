use bytes::Bytes;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{RecordStore, StoreError, WriteMode};

/// Keeps records in process memory. Contents are lost on exit.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    objects: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl RecordStore for MemoryRecordStore {
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.read().await;
        Ok(objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Bytes, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                key: key.to_string(),
            })
    }

    async fn put(&self, key: &str, body: Bytes, mode: WriteMode) -> Result<(), StoreError> {
        let mut objects = self.objects.write().await;
        if mode == WriteMode::Create && objects.contains_key(key) {
            return Err(StoreError::AlreadyExists {
                key: key.to_string(),
            });
        }
        objects.insert(key.to_string(), body);
        Ok(())
    }
}
