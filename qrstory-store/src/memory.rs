use async_trait::async_trait;
use qrstory_blob::BlobHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StoreError, StoreResult, StoryRecord, StoryStore};

/// In-memory repository for tests and local development
#[derive(Clone, Default)]
pub struct MemoryStoryStore {
    records: Arc<RwLock<HashMap<String, StoryRecord>>>,
}

impl MemoryStoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records (test helper)
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StoryStore for MemoryStoryStore {
    async fn insert_unique(&self, record: StoryRecord) -> StoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.public_id) {
            return Err(StoreError::duplicate_key(&record.public_id));
        }
        records.insert(record.public_id.clone(), record);
        Ok(())
    }

    async fn find(&self, public_id: &str) -> StoreResult<StoryRecord> {
        self.records
            .read()
            .await
            .get(public_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(public_id))
    }

    async fn increment_views(&self, public_id: &str) -> StoreResult<StoryRecord> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(public_id)
            .ok_or_else(|| StoreError::not_found(public_id))?;
        record.views += 1;
        Ok(record.clone())
    }

    async fn referenced_handles(&self) -> StoreResult<Vec<BlobHandle>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(|r| r.blob_handle.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> StoryRecord {
        StoryRecord::new(
            id.to_string(),
            BlobHandle::random(),
            "image/png".to_string(),
            42,
        )
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = MemoryStoryStore::new();
        store.insert_unique(record("qrs_one")).await.unwrap();

        let found = store.find("qrs_one").await.unwrap();
        assert_eq!(found.public_id, "qrs_one");
        assert_eq!(found.content_type, "image/png");
        assert_eq!(found.views, 0);
    }

    #[tokio::test]
    async fn second_insert_with_same_id_is_duplicate() {
        let store = MemoryStoryStore::new();
        store.insert_unique(record("qrs_dup")).await.unwrap();

        let err = store.insert_unique(record("qrs_dup")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { ref id } if id == "qrs_dup"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn increment_returns_post_increment_value() {
        let store = MemoryStoryStore::new();
        store.insert_unique(record("qrs_views")).await.unwrap();

        for expected in 1..=3u64 {
            let updated = store.increment_views("qrs_views").await.unwrap();
            assert_eq!(updated.views, expected);
        }
        assert_eq!(store.find("qrs_views").await.unwrap().views, 3);
    }

    #[tokio::test]
    async fn missing_id_is_not_found() {
        let store = MemoryStoryStore::new();
        assert!(matches!(
            store.find("qrs_missing").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
        assert!(matches!(
            store.increment_views("qrs_missing").await.unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn referenced_handles_lists_every_record() {
        let store = MemoryStoryStore::new();
        let a = record("qrs_a");
        let b = record("qrs_b");
        let expected = vec![a.blob_handle.clone(), b.blob_handle.clone()];
        store.insert_unique(a).await.unwrap();
        store.insert_unique(b).await.unwrap();

        let mut handles = store.referenced_handles().await.unwrap();
        let mut expected = expected;
        handles.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        expected.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        assert_eq!(handles, expected);
    }
}
