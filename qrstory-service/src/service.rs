use std::collections::HashSet;
use std::sync::Arc;

use qrstory_blob::store::GetResult;
use qrstory_blob::{one_shot, BlobError, BlobHandle, BlobStore};
use qrstory_store::{StoreError, StoryRecord, StoryStore};
use tracing::warn;

use crate::payload::decode_image_payload;
use crate::{StoryError, StoryIdGenerator, StoryResult};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Tunables for the story service
#[derive(Debug, Clone)]
pub struct StoryServiceConfig {
    /// Prefix for generated public IDs
    pub id_prefix: String,
    /// Random token length after the prefix
    pub id_length: usize,
    /// Absolute max size allowed for a single decoded payload (safety guard)
    pub max_blob_bytes: u64,
}

impl Default for StoryServiceConfig {
    fn default() -> Self {
        Self {
            id_prefix: "qrs_".to_string(),
            id_length: 10,
            max_blob_bytes: 10 * 1024 * 1024, // 10 MB
        }
    }
}

impl StoryServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.id_prefix = prefix.into();
        self
    }

    pub fn with_id_length(mut self, length: usize) -> Self {
        self.id_length = length;
        self
    }

    pub fn with_max_blob_bytes(mut self, bytes: u64) -> Self {
        self.max_blob_bytes = bytes;
        self
    }
}

/// A create request as it arrives from the boundary
#[derive(Debug, Clone, Default)]
pub struct CreateStory {
    /// Base64 payload, with or without a `data:` URI prefix
    pub image_data: String,
    /// Caller-supplied public ID; generated when absent
    pub story_id: Option<String>,
    /// Caller-declared content type; a data-URI mime wins over this
    pub content_type: Option<String>,
}

/// What a successful create returns
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub public_id: String,
    pub handle: BlobHandle,
    /// True when the insert hit an existing record and was treated as
    /// already-satisfied rather than a fresh write
    pub deduplicated: bool,
}

/// The orchestrator: one owned instance wired with injected stores.
pub struct StoryService {
    blobs: Arc<dyn BlobStore>,
    stories: Arc<dyn StoryStore>,
    ids: StoryIdGenerator,
    config: StoryServiceConfig,
}

impl StoryService {
    pub fn new<B, S>(blobs: B, stories: S) -> Self
    where
        B: BlobStore + 'static,
        S: StoryStore + 'static,
    {
        Self::with_config(blobs, stories, StoryServiceConfig::default())
    }

    pub fn with_config<B, S>(blobs: B, stories: S, config: StoryServiceConfig) -> Self
    where
        B: BlobStore + 'static,
        S: StoryStore + 'static,
    {
        Self {
            blobs: Arc::new(blobs),
            stories: Arc::new(stories),
            ids: StoryIdGenerator::new(config.id_prefix.clone(), config.id_length),
            config,
        }
    }

    pub fn config(&self) -> &StoryServiceConfig {
        &self.config
    }

    pub fn id_generator(&self) -> &StoryIdGenerator {
        &self.ids
    }

    /// Create a story: decode, write the blob, insert the mapping.
    ///
    /// The blob write completes before the metadata insert, so a record is
    /// never visible with a half-written blob behind it. No transaction spans
    /// the two writes: a failure after the blob write leaves an orphaned blob
    /// (see [`reconcile_orphans`](Self::reconcile_orphans)).
    pub async fn create(&self, request: CreateStory) -> StoryResult<CreateOutcome> {
        let payload = decode_image_payload(&request.image_data)?;

        if payload.bytes.len() as u64 > self.config.max_blob_bytes {
            return Err(StoryError::invalid_input(format!(
                "Image exceeds maximum size of {} bytes",
                self.config.max_blob_bytes
            )));
        }

        let public_id = match request.story_id {
            Some(id) if !id.trim().is_empty() => id,
            Some(_) => return Err(StoryError::invalid_input("storyId must not be empty")),
            None => self.ids.generate(),
        };

        let content_type = payload
            .content_type
            .or(request.content_type)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        let put = self
            .blobs
            .put(&public_id, Some(&content_type), one_shot(payload.bytes))
            .await
            .map_err(|source| StoryError::StorageWrite { source })?;

        let record = StoryRecord::new(
            public_id.clone(),
            put.handle.clone(),
            content_type,
            put.size_bytes,
        );

        match self.stories.insert_unique(record).await {
            Ok(()) => Ok(CreateOutcome {
                public_id,
                handle: put.handle,
                deduplicated: false,
            }),
            Err(StoreError::DuplicateKey { .. }) => {
                self.duplicate_as_success(public_id, put.handle).await
            }
            Err(source) => {
                warn!(
                    %public_id,
                    orphaned_handle = %put.handle,
                    "metadata insert failed after blob write; blob left orphaned"
                );
                Err(StoryError::MetadataWrite { source })
            }
        }
    }

    /// Policy for a public-ID collision at insert time: treat the request as
    /// already satisfied and answer with the existing record.
    ///
    /// This conflates "ID collision" with "already saved" on purpose, matching
    /// the deployed behavior; callers that wanted a fresh ID never learn the
    /// difference. Kept in one place so the policy can change without touching
    /// the create flow. The blob written for the losing request is orphaned.
    async fn duplicate_as_success(
        &self,
        public_id: String,
        orphaned: BlobHandle,
    ) -> StoryResult<CreateOutcome> {
        warn!(
            %public_id,
            orphaned_handle = %orphaned,
            "public ID already exists; treating create as already-satisfied"
        );

        let handle = match self.stories.find(&public_id).await {
            Ok(existing) => existing.blob_handle,
            Err(err) => {
                // The winning record vanished between insert and lookup;
                // answer with the handle we do have.
                warn!(%public_id, error = %err, "could not load existing record after duplicate");
                orphaned
            }
        };

        Ok(CreateOutcome {
            public_id,
            handle,
            deduplicated: true,
        })
    }

    /// Look up a story and count the view.
    ///
    /// Returns the record as it reads after the increment (re-fetch
    /// semantics). A failed increment is best-effort telemetry: logged,
    /// and the pre-increment record is returned instead of an error.
    pub async fn get_metadata(&self, public_id: &str) -> StoryResult<StoryRecord> {
        let record = self
            .stories
            .find(public_id)
            .await
            .map_err(StoryError::from_lookup)?;

        match self.stories.increment_views(public_id).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                warn!(public_id, error = %err, "view-count increment failed");
                Ok(record)
            }
        }
    }

    /// Look up a story without counting a view (reveal-page redirect path)
    pub async fn peek_metadata(&self, public_id: &str) -> StoryResult<StoryRecord> {
        self.stories
            .find(public_id)
            .await
            .map_err(StoryError::from_lookup)
    }

    /// Open blob bytes by reference: a direct handle when the reference has a
    /// handle shape, otherwise a public ID resolved through the repository.
    ///
    /// Callers may pick their own public IDs, so a handle-shaped reference can
    /// still be a public ID; a miss on the direct path retries through the
    /// repository, and only a miss on both answers not-found.
    ///
    /// The returned stream is lazy and single-pass; mid-transfer failures
    /// surface as stream errors and are never retried here.
    pub async fn open_blob_stream(&self, reference: &str) -> StoryResult<GetResult> {
        if let Some(handle) = BlobHandle::parse(reference) {
            match self.blobs.get(&handle).await {
                Ok(opened) => return Ok(opened),
                Err(BlobError::NotFound { .. }) => {}
                Err(err) => return Err(StoryError::from_blob_read(reference, err)),
            }
        }

        let record = self
            .stories
            .find(reference)
            .await
            .map_err(StoryError::from_lookup)?;

        self.blobs
            .get(&record.blob_handle)
            .await
            .map_err(|err| StoryError::from_blob_read(reference, err))
    }

    /// Maintenance: find blobs no record references, deleting them when
    /// `purge` is set. Never invoked automatically.
    pub async fn reconcile_orphans(&self, purge: bool) -> StoryResult<Vec<BlobHandle>> {
        let stored = self
            .blobs
            .list()
            .await
            .map_err(|source| StoryError::StorageRead { source })?;

        let referenced: HashSet<String> = self
            .stories
            .referenced_handles()
            .await
            .map_err(|source| StoryError::MetadataRead { source })?
            .into_iter()
            .map(|h| h.as_str().to_string())
            .collect();

        let orphans: Vec<BlobHandle> = stored
            .into_iter()
            .filter(|h| !referenced.contains(h.as_str()))
            .collect();

        if purge {
            for handle in &orphans {
                self.blobs
                    .delete(handle)
                    .await
                    .map_err(|source| StoryError::StorageWrite { source })?;
            }
        }

        Ok(orphans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use qrstory_blob::{collect_stream, MemoryBlobStore};
    use qrstory_store::MemoryStoryStore;

    const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfakeimagedata";

    fn png_data_uri() -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(PNG_BYTES))
    }

    fn service() -> (StoryService, MemoryBlobStore, MemoryStoryStore) {
        let blobs = MemoryBlobStore::new();
        let stories = MemoryStoryStore::new();
        (
            StoryService::new(blobs.clone(), stories.clone()),
            blobs,
            stories,
        )
    }

    fn create_request(image_data: String) -> CreateStory {
        CreateStory {
            image_data,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_then_get_metadata_round_trips() {
        let (svc, _, _) = service();

        let outcome = svc.create(create_request(png_data_uri())).await.unwrap();
        assert!(svc.id_generator().matches(&outcome.public_id));
        assert!(!outcome.deduplicated);

        let record = svc.get_metadata(&outcome.public_id).await.unwrap();
        assert_eq!(record.content_type, "image/png");
        assert_eq!(record.size_bytes, PNG_BYTES.len() as u64);
    }

    #[tokio::test]
    async fn blob_round_trips_byte_for_byte() {
        let (svc, _, _) = service();
        let outcome = svc.create(create_request(png_data_uri())).await.unwrap();

        // by public ID
        let opened = svc.open_blob_stream(&outcome.public_id).await.unwrap();
        assert_eq!(opened.content_type.as_deref(), Some("image/png"));
        assert_eq!(collect_stream(opened.stream).await.unwrap(), PNG_BYTES);

        // by direct handle
        let opened = svc.open_blob_stream(outcome.handle.as_str()).await.unwrap();
        assert_eq!(collect_stream(opened.stream).await.unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn view_count_is_exact_under_sequential_reads() {
        let (svc, _, _) = service();
        let outcome = svc.create(create_request(png_data_uri())).await.unwrap();

        for expected in 1..=5u64 {
            let record = svc.get_metadata(&outcome.public_id).await.unwrap();
            assert_eq!(record.views, expected);
        }
    }

    #[tokio::test]
    async fn streaming_does_not_count_views() {
        let (svc, _, _) = service();
        let outcome = svc.create(create_request(png_data_uri())).await.unwrap();

        let _ = svc.open_blob_stream(&outcome.public_id).await.unwrap();
        let record = svc.get_metadata(&outcome.public_id).await.unwrap();
        assert_eq!(record.views, 1);
    }

    #[tokio::test]
    async fn duplicate_explicit_id_is_success_with_one_record() {
        let (svc, blobs, stories) = service();

        let request = CreateStory {
            image_data: png_data_uri(),
            story_id: Some("qrs_fixed".to_string()),
            content_type: None,
        };

        let first = svc.create(request.clone()).await.unwrap();
        assert!(!first.deduplicated);

        let second = svc.create(request).await.unwrap();
        assert!(second.deduplicated);
        assert_eq!(second.public_id, first.public_id);
        assert_eq!(second.handle, first.handle);

        assert_eq!(stories.len().await, 1);
        // the losing write's blob is orphaned, not rolled back
        assert_eq!(blobs.len().await, 2);
    }

    #[tokio::test]
    async fn empty_payload_creates_nothing() {
        let (svc, blobs, stories) = service();

        let err = svc.create(create_request(String::new())).await.unwrap_err();
        assert!(matches!(err, StoryError::InvalidInput { ref message } if message == "No image data provided"));
        assert!(blobs.is_empty().await);
        assert!(stories.is_empty().await);
    }

    #[tokio::test]
    async fn oversized_payload_is_rejected_before_storage() {
        let blobs = MemoryBlobStore::new();
        let stories = MemoryStoryStore::new();
        let svc = StoryService::with_config(
            blobs.clone(),
            stories,
            StoryServiceConfig::default().with_max_blob_bytes(4),
        );

        let err = svc.create(create_request(png_data_uri())).await.unwrap_err();
        assert!(matches!(err, StoryError::InvalidInput { .. }));
        assert!(blobs.is_empty().await);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_on_both_read_paths() {
        let (svc, _, _) = service();

        assert!(matches!(
            svc.get_metadata("qrs_missing").await.unwrap_err(),
            StoryError::NotFound { .. }
        ));
        assert!(matches!(
            svc.open_blob_stream("qrs_missing").await.unwrap_err(),
            StoryError::NotFound { .. }
        ));
        // handle-shaped but dangling
        assert!(matches!(
            svc.open_blob_stream("65a1b2c3d4e5f60718293a4b")
                .await
                .unwrap_err(),
            StoryError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn handle_shaped_public_id_still_streams() {
        let (svc, _, _) = service();
        let request = CreateStory {
            image_data: png_data_uri(),
            story_id: Some("65a1b2c3d4e5f60718293a4b".to_string()),
            content_type: None,
        };

        let outcome = svc.create(request).await.unwrap();
        assert_eq!(outcome.public_id, "65a1b2c3d4e5f60718293a4b");

        // the ID parses as a handle but only resolves through the repository
        let opened = svc.open_blob_stream(&outcome.public_id).await.unwrap();
        assert_eq!(collect_stream(opened.stream).await.unwrap(), PNG_BYTES);
    }

    #[tokio::test]
    async fn declared_content_type_is_used_without_data_uri() {
        let (svc, _, _) = service();
        let request = CreateStory {
            image_data: STANDARD.encode(PNG_BYTES),
            story_id: None,
            content_type: Some("image/webp".to_string()),
        };

        let outcome = svc.create(request).await.unwrap();
        let record = svc.peek_metadata(&outcome.public_id).await.unwrap();
        assert_eq!(record.content_type, "image/webp");
    }

    #[tokio::test]
    async fn peek_metadata_never_counts() {
        let (svc, _, _) = service();
        let outcome = svc.create(create_request(png_data_uri())).await.unwrap();

        let peeked = svc.peek_metadata(&outcome.public_id).await.unwrap();
        assert_eq!(peeked.views, 0);
        assert_eq!(
            svc.get_metadata(&outcome.public_id).await.unwrap().views,
            1
        );
    }

    #[tokio::test]
    async fn reconcile_finds_and_purges_orphans() {
        let (svc, blobs, _) = service();

        let kept = svc.create(create_request(png_data_uri())).await.unwrap();
        // second create against the same explicit ID orphans its blob
        let request = CreateStory {
            image_data: png_data_uri(),
            story_id: Some(kept.public_id.clone()),
            content_type: None,
        };
        svc.create(request).await.unwrap();
        assert_eq!(blobs.len().await, 2);

        let orphans = svc.reconcile_orphans(false).await.unwrap();
        assert_eq!(orphans.len(), 1);
        assert_ne!(orphans[0], kept.handle);
        assert_eq!(blobs.len().await, 2);

        let purged = svc.reconcile_orphans(true).await.unwrap();
        assert_eq!(purged, orphans);
        assert_eq!(blobs.len().await, 1);
        assert!(svc.reconcile_orphans(false).await.unwrap().is_empty());
    }
}
