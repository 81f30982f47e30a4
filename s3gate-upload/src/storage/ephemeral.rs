//! In-memory ephemeral storage backend

use super::traits::{ObjectMetadata, ObjectStore, PutObjectResult, StorageError, StoredObject};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use dashmap::DashMap;
use md5::{Digest, Md5};
use std::sync::Arc;

/// In-memory bucket
struct InMemoryBucket {
    objects: DashMap<String, StoredObject>,
}

impl InMemoryBucket {
    fn new() -> Self {
        Self {
            objects: DashMap::new(),
        }
    }
}

/// Ephemeral (in-memory) storage backend
pub struct EphemeralStore {
    buckets: DashMap<String, Arc<InMemoryBucket>>,
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self {
            buckets: DashMap::new(),
        }
    }

    /// Create a store with one empty bucket
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.create_bucket(bucket);
        store
    }

    /// Create a bucket; existing buckets are left untouched
    pub fn create_bucket(&self, bucket: &str) {
        self.buckets
            .entry(bucket.to_string())
            .or_insert_with(|| Arc::new(InMemoryBucket::new()));
    }

    /// Get a copy of a stored object
    pub fn get_object(&self, bucket: &str, key: &str) -> Result<StoredObject, StorageError> {
        let bucket_ref = self.bucket(bucket)?;
        let object = bucket_ref
            .objects
            .get(key)
            .map(|o| o.value().clone())
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })?;
        Ok(object)
    }

    /// List the keys stored in a bucket, sorted
    pub fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let bucket_ref = self.bucket(bucket)?;
        let mut keys: Vec<String> = bucket_ref.objects.iter().map(|r| r.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    fn bucket(&self, bucket: &str) -> Result<Arc<InMemoryBucket>, StorageError> {
        self.buckets
            .get(bucket)
            .map(|b| Arc::clone(b.value()))
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))
    }

    fn compute_etag(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        format!("\"{}\"", hex::encode(hasher.finalize()))
    }
}

#[async_trait]
impl ObjectStore for EphemeralStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: Bytes,
        metadata: ObjectMetadata,
    ) -> Result<PutObjectResult, StorageError> {
        let bucket_ref = self.bucket(bucket)?;
        let etag = Self::compute_etag(&data);

        bucket_ref.objects.insert(
            key.to_string(),
            StoredObject {
                size: data.len() as u64,
                data,
                etag: etag.clone(),
                last_modified: Utc::now(),
                metadata,
            },
        );

        Ok(PutObjectResult { etag: Some(etag) })
    }
}
