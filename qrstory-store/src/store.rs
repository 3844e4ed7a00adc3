use async_trait::async_trait;
use qrstory_blob::BlobHandle;

use crate::{StoreResult, StoryRecord};

/// Metadata repository contract: unique-key insert, point lookup, atomic
/// view-count increment.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Insert a record, failing with [`StoreError::DuplicateKey`] if the
    /// public ID is already taken. This is the serialization point for
    /// concurrent creates racing on one ID.
    ///
    /// [`StoreError::DuplicateKey`]: crate::StoreError::DuplicateKey
    async fn insert_unique(&self, record: StoryRecord) -> StoreResult<()>;

    /// Point lookup by public ID
    async fn find(&self, public_id: &str) -> StoreResult<StoryRecord>;

    /// Atomically add one view and return the record as it reads *after* the
    /// increment. Callers must not compute the new count locally.
    async fn increment_views(&self, public_id: &str) -> StoreResult<StoryRecord>;

    /// Every blob handle currently referenced by a record (orphan reconciliation)
    async fn referenced_handles(&self) -> StoreResult<Vec<BlobHandle>>;
}
