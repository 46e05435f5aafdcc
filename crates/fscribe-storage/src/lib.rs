//! Filesystem storage for FrameScribe.
//!
//! This crate provides:
//! - `ChunkStore`: persists uploaded byte chunks and reassembles them into
//!   one video file once every sequence number has arrived
//! - `ResultStore`: persists one JSON result document per upload
//! - `StorageLayout`: the chunks/videos/processed directory convention

pub mod chunks;
pub mod error;
pub mod layout;
pub mod results;

pub use chunks::ChunkStore;
pub use error::{StorageError, StorageResult};
pub use layout::StorageLayout;
pub use results::ResultStore;
