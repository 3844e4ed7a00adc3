//! # qrstory-service: the story service
//!
//! Orchestrates the two flows everything else exists for:
//!
//! - **create**: decode the base64 payload, stream the bytes into the blob
//!   store, insert the `publicId → handle` mapping. The repository's unique
//!   index arbitrates ID collisions; a collision is converted to success by a
//!   named policy, never retried.
//! - **read**: look up metadata (counting the view, re-fetch semantics) or
//!   open the blob bytes as a stream, accepting either a public ID or a
//!   direct handle.
//!
//! Stores are injected as owned trait objects; there are no process-wide
//! singletons and no in-process locks around the I/O suspension points.

mod error;
mod id;
mod payload;
mod service;

pub use error::{StoryError, StoryResult};
pub use id::StoryIdGenerator;
pub use payload::{decode_image_payload, DecodedPayload};
pub use service::{CreateOutcome, CreateStory, StoryService, StoryServiceConfig};
