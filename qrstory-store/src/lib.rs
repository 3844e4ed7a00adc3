//! # qrstory-store: story metadata repository
//!
//! Persistent mapping from public story ID to its blob handle plus the
//! immutable facts recorded at creation (content type, size, timestamp) and
//! the one mutable field, the view counter.
//!
//! The repository is the sole authority on public-ID exclusivity: concurrent
//! creates racing on the same ID are serialized by [`StoryStore::insert_unique`],
//! never by an application-level lock.

mod error;
mod memory;
mod record;
mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStoryStore;
pub use record::StoryRecord;
pub use store::StoryStore;
