// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! S3 Object Store Implementation
//!
//! Implements the `ObjectStore` trait over Apache OpenDAL's S3 service as an
//! Anti-Corruption Layer. Works against AWS S3 and S3-compatible endpoints
//! (MinIO, LocalStack, SeaweedFS S3 gateway) when `endpoint` is set.
//!
//! # Operators
//!
//! An OpenDAL operator is bound to a single bucket. Operators are built on
//! first use of a bucket and cached for the lifetime of the store.
//!
//! # Credentials
//!
//! When `access_key_id`/`secret_access_key` are absent, OpenDAL falls back
//! to the ambient AWS credential chain (environment, profile, IMDS).

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use opendal::{services, ErrorKind, Operator};
use tracing::debug;

use crate::config::StorageConfig;
use crate::domain::storage::{ObjectStore, StorageError};

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// OpenDAL-backed S3 adapter
pub struct S3ObjectStore {
    config: StorageConfig,

    /// bucket -> operator
    operators: DashMap<String, Operator>,
}

impl S3ObjectStore {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            operators: DashMap::new(),
        }
    }

    fn build_operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        if bucket.is_empty() {
            return Err(StorageError::Misconfigured("bucket name cannot be empty".to_string()));
        }

        let region = self.config.region.as_deref().unwrap_or(DEFAULT_REGION);
        let mut builder = services::S3::default().bucket(bucket).region(region);

        if let (Some(key_id), Some(secret)) = (
            self.config.access_key_id.as_deref(),
            self.config.secret_access_key.as_deref(),
        ) {
            builder = builder.access_key_id(key_id).secret_access_key(secret);
        }
        if let Some(endpoint) = self.config.endpoint.as_deref() {
            builder = builder.endpoint(endpoint);
        }

        let op = Operator::new(builder)?.finish();
        debug!("Built S3 operator for bucket {} in {}", bucket, region);
        Ok(op)
    }

    fn operator(&self, bucket: &str) -> Result<Operator, StorageError> {
        if let Some(op) = self.operators.get(bucket) {
            return Ok(op.clone());
        }

        let op = self.build_operator(bucket)?;
        self.operators.insert(bucket.to_string(), op.clone());
        Ok(op)
    }

    /// Number of buckets with a cached operator
    pub fn cached_operators(&self) -> usize {
        self.operators.len()
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let op = self.operator(bucket)?;
        let size = body.len();

        op.write_with(key, body).content_type(content_type).await?;

        debug!("Uploaded s3://{}/{} ({} bytes)", bucket, key, size);
        Ok(())
    }

    async fn signed_url(&self, bucket: &str, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let op = self.operator(bucket)?;
        let request = op.presign_read(key, ttl).await?;
        Ok(request.uri().to_string())
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let op = self.operator(bucket)?;
        match op.delete(key).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StorageConfig {
        StorageConfig {
            region: Some("eu-west-1".to_string()),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            deployment_bucket: Some("packages".to_string()),
            endpoint: Some("http://127.0.0.1:9000".to_string()),
            ..StorageConfig::default()
        }
    }

    #[test]
    fn test_operators_are_cached_per_bucket() {
        let store = S3ObjectStore::new(config());

        store.operator("packages").unwrap();
        store.operator("packages").unwrap();
        store.operator("contexts").unwrap();

        assert_eq!(store.cached_operators(), 2);
    }

    #[test]
    fn test_empty_bucket_is_misconfigured() {
        let store = S3ObjectStore::new(config());
        assert!(matches!(store.operator(""), Err(StorageError::Misconfigured(_))));
        assert_eq!(store.cached_operators(), 0);
    }

    #[tokio::test]
    async fn test_signed_url_targets_bucket_and_key() {
        let store = S3ObjectStore::new(config());
        let url = store
            .signed_url("packages", "deployments/a/t/deployment-package.zip", Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(url.contains("deployments/a/t/deployment-package.zip"));
        assert!(url.contains("X-Amz-Expires=3600"));
    }
}
