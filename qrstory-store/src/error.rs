use thiserror::Error;

/// Result type for repository operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur at the metadata repository
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate public ID: {id}")]
    DuplicateKey { id: String },

    #[error("Story not found: {id}")]
    NotFound { id: String },

    #[error("Repository backend error: {source}")]
    Backend {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn duplicate_key<S: Into<String>>(id: S) -> Self {
        Self::DuplicateKey { id: id.into() }
    }

    pub fn not_found<S: Into<String>>(id: S) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(error),
        }
    }
}
