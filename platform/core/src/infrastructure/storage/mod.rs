// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Storage Infrastructure Module
//!
//! Concrete implementations of the `ObjectStore` trait for the deployment
//! bucket.

pub mod s3;

pub use s3::S3ObjectStore;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;

use crate::config::StorageConfig;
use crate::domain::storage::{ObjectStore, StorageError};

/// Object store backend selection
#[derive(Debug, Clone)]
pub enum ObjectStoreBackend {
    /// S3 or any S3-compatible endpoint (production)
    S3(StorageConfig),

    /// Process-local store for development and tests
    InMemory,
}

/// Factory function to create an object store from configuration
pub fn create_object_store(backend: ObjectStoreBackend) -> Arc<dyn ObjectStore> {
    match backend {
        ObjectStoreBackend::S3(config) => Arc::new(S3ObjectStore::new(config)),
        ObjectStoreBackend::InMemory => Arc::new(InMemoryObjectStore::new()),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredBlob {
    pub body: Bytes,
    pub content_type: String,
}

/// HashMap-backed object store. Signed URLs use the `memory://` scheme and
/// carry the requested lifetime so tests can assert on it.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    objects: Arc<RwLock<HashMap<(String, String), StoredBlob>>>,
    failing_keys: Arc<RwLock<HashSet<String>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `put` to `key` fail with `StorageError::Unavailable`
    pub fn fail_puts_to(&self, key: impl Into<String>) {
        self.failing_keys.write().insert(key.into());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredBlob> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    /// Keys stored in `bucket`, sorted
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.failing_keys.read().contains(key) {
            return Err(StorageError::Unavailable(format!("injected failure for {}", key)));
        }

        self.objects.write().insert(
            (bucket.to_string(), key.to_string()),
            StoredBlob {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, StorageError> {
        Ok(format!(
            "memory://{}/{}?expires_in={}",
            bucket,
            key,
            ttl.as_secs()
        ))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.objects
            .write()
            .remove(&(bucket.to_string(), key.to_string()));
        Ok(())
    }
}
