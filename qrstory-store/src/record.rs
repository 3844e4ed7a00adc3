use chrono::{DateTime, Utc};
use qrstory_blob::BlobHandle;
use serde::{Deserialize, Serialize};

/// One stored story: a public ID mapped to a blob handle plus creation facts.
///
/// Every field except `views` is immutable once the record exists. A record is
/// only inserted after the blob write completed, so `blob_handle` always
/// points at fully written content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryRecord {
    pub public_id: String,
    pub blob_handle: BlobHandle,
    pub content_type: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub views: u64,
}

impl StoryRecord {
    /// Build a fresh record with `views` at zero and `created_at` now
    pub fn new(
        public_id: String,
        blob_handle: BlobHandle,
        content_type: String,
        size_bytes: u64,
    ) -> Self {
        Self {
            public_id,
            blob_handle,
            content_type,
            size_bytes,
            created_at: Utc::now(),
            views: 0,
        }
    }
}
