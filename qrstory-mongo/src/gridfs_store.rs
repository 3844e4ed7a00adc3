use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson};
use bytes::Bytes;
use futures_util::io::{AsyncReadExt, AsyncWriteExt};
use futures_util::{StreamExt, TryStreamExt};
use mongodb::gridfs::GridFsBucket;
use mongodb::options::GridFsBucketOptions;
use tracing::warn;

use qrstory_blob::store::{GetResult, ObjectHead, PutResult};
use qrstory_blob::{BlobError, BlobHandle, BlobResult, BlobStore, ByteStream};

use crate::MongoClient;

const READ_CHUNK_BYTES: usize = 64 * 1024;

/// [`BlobStore`] over a GridFS bucket.
///
/// The handle is the hex ObjectId of the files document, assigned by the
/// bucket on upload. The content type travels in the files document metadata.
#[derive(Clone)]
pub struct GridFsBlobStore {
    bucket: GridFsBucket,
}

impl GridFsBlobStore {
    pub fn new(client: &MongoClient, bucket_name: &str) -> Self {
        let options = GridFsBucketOptions::builder()
            .bucket_name(bucket_name.to_string())
            .build();
        Self {
            bucket: client.database().gridfs_bucket(options),
        }
    }

    fn parse_handle(handle: &BlobHandle) -> BlobResult<ObjectId> {
        ObjectId::parse_str(handle.as_str())
            .map_err(|_| BlobError::invalid(format!("not a GridFS handle: {}", handle)))
    }

    async fn files_doc(
        &self,
        id: ObjectId,
    ) -> BlobResult<Option<mongodb::gridfs::FilesCollectionDocument>> {
        let mut cursor = self
            .bucket
            .find(doc! { "_id": id })
            .await
            .map_err(BlobError::backend)?;
        cursor.try_next().await.map_err(BlobError::backend)
    }
}

#[async_trait]
impl BlobStore for GridFsBlobStore {
    async fn put(
        &self,
        name: &str,
        content_type: Option<&str>,
        mut stream: ByteStream,
    ) -> BlobResult<PutResult> {
        let mut metadata = doc! {};
        if let Some(ct) = content_type {
            metadata.insert("contentType", ct);
        }

        let mut upload = self
            .bucket
            .open_upload_stream(name)
            .metadata(metadata)
            .await
            .map_err(BlobError::backend)?;

        let mut size_bytes: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    if let Err(abort_err) = upload.abort().await {
                        warn!(error = %abort_err, "failed to abort GridFS upload");
                    }
                    return Err(BlobError::from(err));
                }
            };
            if let Err(err) = upload.write_all(&chunk).await {
                if let Err(abort_err) = upload.abort().await {
                    warn!(error = %abort_err, "failed to abort GridFS upload");
                }
                return Err(BlobError::from(err));
            }
            size_bytes += chunk.len() as u64;
        }

        // The files document only exists once close() completes; a handle is
        // never handed out for a partial write.
        let id = upload.id().clone();
        upload.close().await.map_err(BlobError::from)?;

        let oid = id
            .as_object_id()
            .ok_or_else(|| BlobError::invalid("GridFS assigned a non-ObjectId file id"))?;

        Ok(PutResult {
            handle: BlobHandle::from_string(oid.to_hex()),
            size_bytes,
        })
    }

    async fn get(&self, handle: &BlobHandle) -> BlobResult<GetResult> {
        let oid = Self::parse_handle(handle)?;
        let file = self
            .files_doc(oid)
            .await?
            .ok_or_else(|| BlobError::not_found(handle.as_str()))?;

        let content_type = file
            .metadata
            .as_ref()
            .and_then(|m| m.get_str("contentType").ok())
            .map(String::from);

        let mut download = self
            .bucket
            .open_download_stream(Bson::ObjectId(oid))
            .await
            .map_err(BlobError::backend)?;

        // Chunks are pulled lazily; dropping the stream drops the cursor and
        // releases the session on every exit path.
        let stream = async_stream::try_stream! {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            loop {
                let n = download.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                yield Bytes::copy_from_slice(&buf[..n]);
            }
        };

        Ok(GetResult {
            stream: Box::pin(stream),
            size_bytes: file.length,
            content_type,
        })
    }

    async fn head(&self, handle: &BlobHandle) -> BlobResult<ObjectHead> {
        let oid = Self::parse_handle(handle)?;
        let file = self
            .files_doc(oid)
            .await?
            .ok_or_else(|| BlobError::not_found(handle.as_str()))?;

        Ok(ObjectHead {
            size_bytes: file.length,
            content_type: file
                .metadata
                .as_ref()
                .and_then(|m| m.get_str("contentType").ok())
                .map(String::from),
        })
    }

    async fn delete(&self, handle: &BlobHandle) -> BlobResult<()> {
        let oid = Self::parse_handle(handle)?;
        self.bucket
            .delete(Bson::ObjectId(oid))
            .await
            .map_err(BlobError::backend)
    }

    async fn list(&self) -> BlobResult<Vec<BlobHandle>> {
        let mut cursor = self
            .bucket
            .find(doc! {})
            .await
            .map_err(BlobError::backend)?;

        let mut handles = Vec::new();
        while let Some(file) = cursor.try_next().await.map_err(BlobError::backend)? {
            if let Some(oid) = file.id.as_object_id() {
                handles.push(BlobHandle::from_string(oid.to_hex()));
            }
        }
        Ok(handles)
    }
}

#[cfg(test)]
mod tests {
    // Exercised against a live server via the qrstory-server binary; the
    // trait-level behavior is covered by MemoryBlobStore's tests.
}
