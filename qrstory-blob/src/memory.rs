use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::store::{GetResult, ObjectHead, PutResult};
use crate::{collect_stream, one_shot, BlobError, BlobHandle, BlobResult, BlobStore, ByteStream};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Bytes,
    content_type: Option<String>,
}

/// In-memory blob store for tests and local development.
///
/// Buffers whole objects; fine for the image sizes this backend handles,
/// not meant for production traffic.
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects (test helper)
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        _name: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let data = Bytes::from(collect_stream(stream).await?);
        let size_bytes = data.len() as u64;
        let handle = BlobHandle::random();

        self.objects.write().await.insert(
            handle.as_str().to_string(),
            StoredObject {
                data,
                content_type: content_type.map(|ct| ct.to_string()),
            },
        );

        Ok(PutResult { handle, size_bytes })
    }

    async fn get(&self, handle: &BlobHandle) -> BlobResult<GetResult> {
        let objects = self.objects.read().await;
        let object = objects
            .get(handle.as_str())
            .ok_or_else(|| BlobError::not_found(handle.as_str()))?;

        Ok(GetResult {
            stream: one_shot(object.data.clone()),
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
        })
    }

    async fn head(&self, handle: &BlobHandle) -> BlobResult<ObjectHead> {
        let objects = self.objects.read().await;
        let object = objects
            .get(handle.as_str())
            .ok_or_else(|| BlobError::not_found(handle.as_str()))?;

        Ok(ObjectHead {
            size_bytes: object.data.len() as u64,
            content_type: object.content_type.clone(),
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        self.objects
            .write()
            .await
            .remove(handle.as_str())
            .map(|_| ())
            .ok_or_else(|| BlobError::not_found(handle.as_str()))
    }

    async fn list(&self) -> BlobResult<Vec<BlobHandle>> {
        Ok(self
            .objects
            .read()
            .await
            .keys()
            .map(|k| BlobHandle::from_string(k.clone()))
            .collect())
    }
}
