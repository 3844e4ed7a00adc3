//! # qrstory-blob: blob storage for the qrstory backend
//!
//! A small storage seam: binary content goes in as a stream, an opaque
//! [`BlobHandle`] comes back, and the same handle later yields the bytes as a
//! lazy stream. The handle is assigned by the store, never by the caller, and
//! is only ever held by reference in metadata records.
//!
//! Backends:
//! - [`MemoryBlobStore`] for tests and local development
//! - [`S3CompatibleStore`] for any S3-compatible object store
//! - a GridFS-backed store lives in `qrstory-mongo`
//!
//! ```rust
//! use qrstory_blob::prelude::*;
//! use qrstory_blob::MemoryBlobStore;
//!
//! # #[tokio::main]
//! # async fn main() -> BlobResult<()> {
//! let store = MemoryBlobStore::new();
//! let put = store
//!     .put("hello.txt", Some("text/plain"), qrstory_blob::one_shot(b"hi".as_ref().into()))
//!     .await?;
//!
//! let opened = store.get(&put.handle).await?;
//! assert_eq!(opened.size_bytes, 2);
//! # Ok(())
//! # }
//! ```

mod error;
mod memory;
mod s3;
pub mod store;
mod types;

pub use error::{BlobError, BlobResult};
pub use memory::MemoryBlobStore;
pub use s3::{S3CompatibleStore, S3Config};
pub use store::{BlobStore, GetResult, ObjectHead, PutResult};
pub use types::{collect_stream, one_shot, BlobHandle, ByteStream};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{BlobError, BlobHandle, BlobResult, BlobStore, ByteStream};
}
