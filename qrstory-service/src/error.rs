use qrstory_blob::BlobError;
use qrstory_store::StoreError;
use thiserror::Error;

/// Result type for story service operations
pub type StoryResult<T> = Result<T, StoryError>;

/// The service-level error taxonomy.
///
/// `DuplicateKey` is deliberately absent: the create flow recovers from it
/// locally (see `StoryService::duplicate_as_success`) and it never crosses
/// this boundary. Everything here propagates to the HTTP surface unmodified.
#[derive(Error, Debug)]
pub enum StoryError {
    #[error("{message}")]
    InvalidInput { message: String },

    #[error("Story not found: {id}")]
    NotFound { id: String },

    #[error("Blob write failed")]
    StorageWrite {
        #[source]
        source: BlobError,
    },

    #[error("Blob read failed")]
    StorageRead {
        #[source]
        source: BlobError,
    },

    #[error("Metadata insert failed")]
    MetadataWrite {
        #[source]
        source: StoreError,
    },

    #[error("Metadata lookup failed")]
    MetadataRead {
        #[source]
        source: StoreError,
    },
}

impl StoryError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Map a repository lookup failure: absence is `NotFound`, anything else
    /// is an internal read failure.
    pub(crate) fn from_lookup(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id } => Self::NotFound { id },
            other => Self::MetadataRead { source: other },
        }
    }

    /// Map a blob read failure: a dangling handle reads as `NotFound`.
    pub(crate) fn from_blob_read(reference: &str, err: BlobError) -> Self {
        match err {
            BlobError::NotFound { .. } | BlobError::Invalid { .. } => Self::NotFound {
                id: reference.to_string(),
            },
            other => Self::StorageRead { source: other },
        }
    }
}
