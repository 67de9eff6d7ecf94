// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Object Store Trait - Anti-Corruption Layer for the artifact bucket
//!
//! Narrow interface over the S3-compatible object store holding deployment
//! packages and build contexts. Transfer mechanics (multipart, retries,
//! checksums) belong to the client behind this trait and are not
//! reimplemented here.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `body` to `bucket/key`, replacing any existing object
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Pre-signed GET URL for `bucket/key` valid for `ttl`
    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Delete `bucket/key`. Deleting a missing object is not an error.
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage client misconfigured: {0}")]
    Misconfigured(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("Unknown storage error: {0}")]
    Unknown(String),
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        use opendal::ErrorKind;

        match err.kind() {
            ErrorKind::NotFound => StorageError::NotFound(err.to_string()),
            ErrorKind::PermissionDenied => StorageError::PermissionDenied(err.to_string()),
            ErrorKind::ConfigInvalid => StorageError::Misconfigured(err.to_string()),
            ErrorKind::RateLimited => StorageError::Unavailable(err.to_string()),
            _ => StorageError::Unknown(err.to_string()),
        }
    }
}

/// Reject keys the bucket would interpret differently than intended.
pub fn validate_object_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key cannot be empty".to_string()));
    }
    if key.starts_with('/') {
        return Err(StorageError::InvalidKey(format!("key must be relative: {}", key)));
    }
    if key.split('/').any(|segment| segment == "..") {
        return Err(StorageError::InvalidKey(format!("key cannot traverse upwards: {}", key)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_validation() {
        assert!(validate_object_key("agents/a1/packages/t1.zip").is_ok());
        assert!(matches!(validate_object_key(""), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_object_key("/abs/key"), Err(StorageError::InvalidKey(_))));
        assert!(matches!(validate_object_key("a/../b"), Err(StorageError::InvalidKey(_))));
    }
}
