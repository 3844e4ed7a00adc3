//! # qrstory-mongo: MongoDB backends
//!
//! The production pairing the original deployment uses: story metadata in a
//! plain collection with a unique index on `publicId`, and blob bytes in a
//! GridFS bucket whose file ObjectId doubles as the blob handle.
//!
//! Both stores hang off one explicitly constructed [`MongoClient`]; nothing
//! here is a process-wide singleton, and the client exposes `shutdown` for
//! clean teardown.

mod client;
mod gridfs_store;
mod story_store;

pub use client::MongoClient;
pub use gridfs_store::GridFsBlobStore;
pub use story_store::MongoStoryStore;
