use async_trait::async_trait;

use crate::{BlobHandle, BlobResult, ByteStream};

/// Core blob storage operations - must be implemented by all storage backends.
///
/// The store assigns handles; `put` returns one only after every byte has been
/// flushed, so a handle in the wild always points at complete content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store a blob from a stream. Completes only after the full write.
    async fn put(
        &self,
        name: &str,
        content_type: Option<&str>,
        stream: ByteStream,
    ) -> BlobResult<PutResult>;

    /// Open a blob as a lazy, single-pass stream
    async fn get(&self, handle: &BlobHandle) -> BlobResult<GetResult>;

    /// Get blob metadata without content
    async fn head(&self, handle: &BlobHandle) -> BlobResult<ObjectHead>;

    /// Delete a blob
    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()>;

    /// Enumerate every handle the store knows about (orphan reconciliation)
    async fn list(&self) -> BlobResult<Vec<BlobHandle>>;
}

/// Result of a successful put operation
#[derive(Debug, Clone)]
pub struct PutResult {
    pub handle: BlobHandle,
    pub size_bytes: u64,
}

/// Result of a get operation
pub struct GetResult {
    pub stream: ByteStream,
    pub size_bytes: u64,
    pub content_type: Option<String>,
}

// Derive is off the table with a boxed stream inside; show the metadata only.
impl std::fmt::Debug for GetResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResult")
            .field("size_bytes", &self.size_bytes)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Metadata about a blob
#[derive(Debug, Clone)]
pub struct ObjectHead {
    pub size_bytes: u64,
    pub content_type: Option<String>,
}
