use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::{StoryError, StoryResult};

/// A decoded upload payload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub bytes: Bytes,
    /// Mime taken from a `data:` URI prefix, when one was present
    pub content_type: Option<String>,
}

/// Decode a base64 image payload, stripping an optional `data:` URI prefix.
///
/// The data-URI mime, when present, is carried along; it takes precedence
/// over any caller-declared content type. Empty or undecodable input is
/// rejected before anything touches storage.
pub fn decode_image_payload(raw: &str) -> StoryResult<DecodedPayload> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(StoryError::invalid_input("No image data provided"));
    }

    let (content_type, encoded) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let (header, body) = rest
                .split_once(";base64,")
                .ok_or_else(|| StoryError::invalid_input("Malformed data URI"))?;
            let mime = (!header.is_empty()).then(|| header.to_string());
            (mime, body)
        }
        None => (None, raw),
    };

    // Browsers are allowed to wrap base64; the decoder is not.
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();

    let bytes = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|_| StoryError::invalid_input("Image data is not valid base64"))?;

    if bytes.is_empty() {
        return Err(StoryError::invalid_input("No image data provided"));
    }

    Ok(DecodedPayload {
        bytes: Bytes::from(bytes),
        content_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base64_decodes() {
        let payload = decode_image_payload("aGVsbG8=").unwrap();
        assert_eq!(&payload.bytes[..], b"hello");
        assert_eq!(payload.content_type, None);
    }

    #[test]
    fn data_uri_prefix_is_stripped_and_mime_kept() {
        let payload = decode_image_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(&payload.bytes[..], b"hello");
        assert_eq!(payload.content_type.as_deref(), Some("image/png"));
    }

    #[test]
    fn wrapped_base64_is_tolerated() {
        let payload = decode_image_payload("aGVs\nbG8=").unwrap();
        assert_eq!(&payload.bytes[..], b"hello");
    }

    #[test]
    fn empty_input_is_invalid() {
        let err = decode_image_payload("").unwrap_err();
        assert!(matches!(err, StoryError::InvalidInput { ref message } if message == "No image data provided"));
        assert!(decode_image_payload("   ").is_err());
    }

    #[test]
    fn garbage_is_invalid() {
        assert!(matches!(
            decode_image_payload("!!not-base64!!").unwrap_err(),
            StoryError::InvalidInput { .. }
        ));
    }

    #[test]
    fn data_uri_without_base64_marker_is_invalid() {
        assert!(decode_image_payload("data:image/png,rawdata").is_err());
    }

    #[test]
    fn base64_of_nothing_is_invalid() {
        assert!(decode_image_payload("data:image/png;base64,").is_err());
    }
}
