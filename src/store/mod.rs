//! Durable storage for submitted vote records.
//!
//! [`RecordStore`] is the async trait the rest of the crate talks to.
//! [`S3RecordStore`] keeps records in an S3 bucket, [`FsRecordStore`] in a
//! local directory and [`MemoryRecordStore`] in process memory.
//! [`loader::load_all`] reads every record back for aggregation.

mod fs;
pub mod loader;
mod memory;
pub mod naming;
mod s3;

pub use fs::FsRecordStore;
pub use loader::{StoredRecord, load_all, load_records};
pub use memory::MemoryRecordStore;
pub use s3::S3RecordStore;

use bytes::Bytes;

/// Errors raised at the storage boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The namespace could not be listed or an object could not be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    #[error("object not found: {key}")]
    NotFound { key: String },

    /// A create-only write hit an existing object.
    #[error("object already exists: {key}")]
    AlreadyExists { key: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
        }
    }
}

/// How [`RecordStore::put`] treats an existing object at the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with [`StoreError::AlreadyExists`].
    Create,
    /// Replace the existing object.
    Overwrite,
}

/// A key-value blob store keyed by `/`-separated paths.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every key starting with `prefix`, in no particular order.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    async fn put(&self, key: &str, body: Bytes, mode: WriteMode) -> Result<(), StoreError>;
}
