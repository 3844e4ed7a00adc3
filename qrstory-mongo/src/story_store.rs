use async_trait::async_trait;
use bson::doc;
use chrono::{DateTime, Utc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, IndexModel};
use serde::{Deserialize, Serialize};

use qrstory_blob::BlobHandle;
use qrstory_store::{StoreError, StoreResult, StoryRecord, StoryStore};

use crate::MongoClient;

/// Mongo server error code for a unique-index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Wire shape of a story document; field names match the original collection
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoryDocument {
    public_id: String,
    file_id: String,
    content_type: String,
    length: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    upload_date: DateTime<Utc>,
    views: i64,
}

impl From<StoryRecord> for StoryDocument {
    fn from(record: StoryRecord) -> Self {
        Self {
            public_id: record.public_id,
            file_id: record.blob_handle.as_str().to_string(),
            content_type: record.content_type,
            length: record.size_bytes as i64,
            upload_date: record.created_at,
            views: record.views as i64,
        }
    }
}

impl From<StoryDocument> for StoryRecord {
    fn from(doc: StoryDocument) -> Self {
        Self {
            public_id: doc.public_id,
            blob_handle: BlobHandle::from_string(doc.file_id),
            content_type: doc.content_type,
            size_bytes: doc.length.max(0) as u64,
            created_at: doc.upload_date,
            views: doc.views.max(0) as u64,
        }
    }
}

/// [`StoryStore`] backed by a MongoDB collection with a unique `publicId` index.
///
/// The unique index is the serialization point for concurrent creates; the
/// server, not this process, decides who wins.
#[derive(Clone)]
pub struct MongoStoryStore {
    collection: Collection<StoryDocument>,
}

impl MongoStoryStore {
    /// Open the collection and ensure its unique index exists
    pub async fn new(client: &MongoClient, collection_name: &str) -> StoreResult<Self> {
        let collection = client.database().collection::<StoryDocument>(collection_name);

        let index = IndexModel::builder()
            .keys(doc! { "publicId": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        collection
            .create_index(index)
            .await
            .map_err(StoreError::backend)?;

        Ok(Self { collection })
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        match *err.kind {
            ErrorKind::Write(WriteFailure::WriteError(ref write_err)) => {
                write_err.code == DUPLICATE_KEY_CODE
            }
            _ => false,
        }
    }
}

#[async_trait]
impl StoryStore for MongoStoryStore {
    async fn insert_unique(&self, record: StoryRecord) -> StoreResult<()> {
        let public_id = record.public_id.clone();
        self.collection
            .insert_one(StoryDocument::from(record))
            .await
            .map_err(|err| {
                if Self::is_duplicate_key(&err) {
                    StoreError::duplicate_key(public_id)
                } else {
                    StoreError::backend(err)
                }
            })?;
        Ok(())
    }

    async fn find(&self, public_id: &str) -> StoreResult<StoryRecord> {
        self.collection
            .find_one(doc! { "publicId": public_id })
            .await
            .map_err(StoreError::backend)?
            .map(StoryRecord::from)
            .ok_or_else(|| StoreError::not_found(public_id))
    }

    async fn increment_views(&self, public_id: &str) -> StoreResult<StoryRecord> {
        // ReturnDocument::After gives the post-increment document in one round
        // trip; the count is never computed client-side.
        self.collection
            .find_one_and_update(
                doc! { "publicId": public_id },
                doc! { "$inc": { "views": 1 } },
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(StoreError::backend)?
            .map(StoryRecord::from)
            .ok_or_else(|| StoreError::not_found(public_id))
    }

    async fn referenced_handles(&self) -> StoreResult<Vec<BlobHandle>> {
        let values = self
            .collection
            .distinct("fileId", doc! {})
            .await
            .map_err(StoreError::backend)?;

        Ok(values
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| BlobHandle::from_string(s.to_string())))
            .collect())
    }
}
