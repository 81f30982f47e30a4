//! Storage backend traits

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Object not found: {bucket}/{key}")]
    ObjectNotFound { bucket: String, key: String },

    #[error("Storage client configuration error: {0}")]
    Config(String),

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// Object metadata sent alongside the body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
}

/// A stored object (in-memory backend only)
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub etag: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub metadata: ObjectMetadata,
}

/// Result of a PUT operation
#[derive(Debug)]
pub struct PutObjectResult {
    pub etag: Option<String>,
}

/// Abstract storage backend trait
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Put an object, replacing any object already stored under `key`
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<PutObjectResult, StorageError>;
}
