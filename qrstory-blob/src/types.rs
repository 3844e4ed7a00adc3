use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use uuid::Uuid;

use crate::{BlobError, BlobResult};

/// Stream of bytes for blob content
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Opaque reference to stored bytes, assigned by the blob store.
///
/// Handles are not human-readable and carry no meaning outside the store that
/// issued them. Metadata records hold them by reference only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(String);

impl BlobHandle {
    /// Generate a fresh random handle (used by stores that key objects themselves)
    pub fn random() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string
    pub fn from_string(handle: String) -> Self {
        Self(handle)
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a caller-supplied reference as a direct handle.
    ///
    /// Accepts only the shapes handles actually take: a 24-char hex ObjectId
    /// (GridFS) or a UUID with or without hyphens (memory/S3 stores). Public
    /// IDs carry a non-hex prefix and never match, which is what lets callers
    /// pass either form to the read path.
    pub fn parse(reference: &str) -> Option<Self> {
        let is_hex = |s: &str| s.bytes().all(|b| b.is_ascii_hexdigit());
        match reference.len() {
            24 | 32 if is_hex(reference) => Some(Self(reference.to_string())),
            36 if Uuid::parse_str(reference).is_ok() => Some(Self(reference.to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wrap an in-memory buffer as a single-chunk `ByteStream`
pub fn one_shot(bytes: Bytes) -> ByteStream {
    Box::pin(futures_util::stream::once(async move { Ok(bytes) }))
}

/// Drain a `ByteStream` into a buffer
pub async fn collect_stream(mut stream: ByteStream) -> BlobResult<Vec<u8>> {
    let mut data = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(BlobError::from)?;
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_object_id_and_uuid_shapes() {
        assert!(BlobHandle::parse("65a1b2c3d4e5f60718293a4b").is_some());
        assert!(BlobHandle::parse(&Uuid::new_v4().simple().to_string()).is_some());
        assert!(BlobHandle::parse(&Uuid::new_v4().to_string()).is_some());
    }

    #[test]
    fn parse_rejects_public_ids() {
        assert!(BlobHandle::parse("qrs_Ab3dE9fQ1z").is_none());
        assert!(BlobHandle::parse("").is_none());
        // right length, wrong alphabet
        assert!(BlobHandle::parse("zzzzzzzzzzzzzzzzzzzzzzzz").is_none());
    }

    #[tokio::test]
    async fn one_shot_round_trips() {
        let collected = collect_stream(one_shot(Bytes::from_static(b"abc")))
            .await
            .unwrap();
        assert_eq!(collected, b"abc");
    }
}
