// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Artifact Storage Application Service
//!
//! Thin policy layer over [`ObjectStore`]:
//!
//! - the bucket defaults to the configured deployment bucket and the call
//!   fails with a configuration error when neither is available;
//! - signed download URLs default to the configured lifetime (24h);
//! - a deployment package upload is upload-then-sign;
//! - a build context upload fans four file uploads out concurrently.
//!
//! Build context uploads are not atomic by default. With
//! [`BuildContextPolicy::BestEffort`] files that did upload stay in the
//! bucket when a sibling fails; [`BuildContextPolicy::Compensating`]
//! deletes them before surfacing the error.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::application::error::PlatformResult;
use crate::config::{ConfigError, StorageConfig};
use crate::domain::agent::AgentId;
use crate::domain::clock::Clock;
use crate::domain::storage::{validate_object_key, ObjectStore};

pub const PACKAGE_CONTENT_TYPE: &str = "application/zip";

/// Location of an uploaded object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of `upload_deployment_package`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageUpload {
    pub bucket: String,
    pub key: String,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

/// Files making up a container build context for an agent
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub agent_code: String,
    pub requirements: String,
    pub dockerfile: String,
    pub mcp_server: String,
}

impl BuildContext {
    fn files(&self) -> [(&'static str, &str, &'static str); 4] {
        [
            ("agent.py", self.agent_code.as_str(), "text/x-python"),
            ("requirements.txt", self.requirements.as_str(), "text/plain"),
            ("Dockerfile", self.dockerfile.as_str(), "text/plain"),
            ("mcp_server.py", self.mcp_server.as_str(), "text/x-python"),
        ]
    }
}

/// What to do with already-uploaded files when one build context upload fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildContextPolicy {
    /// Leave successful uploads in place
    #[default]
    BestEffort,
    /// Delete successful uploads, then report the failure
    Compensating,
}

pub struct ArtifactStorage {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
    clock: Arc<dyn Clock>,
}

impl ArtifactStorage {
    /// Configuration is validated here, once, rather than per call.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        config: StorageConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config, clock })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub async fn upload(
        &self,
        bucket: Option<&str>,
        key: &str,
        body: impl Into<Bytes> + Send,
        content_type: &str,
    ) -> PlatformResult<StoredObject> {
        let bucket = self.config.resolve_bucket(bucket)?;
        validate_object_key(key)?;

        let body = body.into();
        let size = body.len();
        self.store.put(&bucket, key, body, content_type).await?;

        debug!("Uploaded s3://{}/{} ({} bytes, {})", bucket, key, size, content_type);
        Ok(StoredObject {
            bucket,
            key: key.to_string(),
        })
    }

    /// Pre-signed download URL; `ttl` defaults to the configured lifetime.
    pub async fn signed_download_url(
        &self,
        bucket: Option<&str>,
        key: &str,
        ttl: Option<Duration>,
    ) -> PlatformResult<SignedUrl> {
        let bucket = self.config.resolve_bucket(bucket)?;
        validate_object_key(key)?;

        let ttl = ttl.unwrap_or(self.config.signed_url_ttl);
        let expires_at = expiry_after(self.clock.now(), ttl);
        let url = self.store.signed_url(&bucket, key, ttl).await?;

        Ok(SignedUrl { url, expires_at })
    }

    pub async fn delete(&self, bucket: Option<&str>, key: &str) -> PlatformResult<()> {
        let bucket = self.config.resolve_bucket(bucket)?;
        validate_object_key(key)?;

        self.store.delete(&bucket, key).await?;
        debug!("Deleted s3://{}/{}", bucket, key);
        Ok(())
    }

    /// Upload a zipped deployment package and sign a download URL for it.
    pub async fn upload_deployment_package(
        &self,
        agent_id: AgentId,
        test_id: &str,
        archive: impl Into<Bytes> + Send,
    ) -> PlatformResult<PackageUpload> {
        let key = package_key(agent_id, test_id);
        let stored = self.upload(None, &key, archive, PACKAGE_CONTENT_TYPE).await?;
        let signed = self
            .signed_download_url(Some(&stored.bucket), &stored.key, None)
            .await?;

        info!("Deployment package for agent {} uploaded to s3://{}/{}", agent_id, stored.bucket, stored.key);
        Ok(PackageUpload {
            bucket: stored.bucket,
            key: stored.key,
            download_url: signed.url,
            expires_at: signed.expires_at,
        })
    }

    /// Upload the four build context files under `prefix` concurrently.
    ///
    /// All uploads run to completion before the outcome is decided. On
    /// failure the first error in file order is returned.
    pub async fn upload_build_context(
        &self,
        bucket: Option<&str>,
        prefix: &str,
        context: &BuildContext,
        policy: BuildContextPolicy,
    ) -> PlatformResult<Vec<StoredObject>> {
        let bucket = self.config.resolve_bucket(bucket)?;
        let prefix = prefix.trim_end_matches('/');

        let uploads = context.files().map(|(name, content, content_type)| {
            let key = format!("{}/{}", prefix, name);
            let body = Bytes::copy_from_slice(content.as_bytes());
            let bucket = bucket.as_str();
            async move { self.upload(Some(bucket), &key, body, content_type).await }
        });

        let mut stored = Vec::new();
        let mut first_error = None;
        for result in join_all(uploads).await {
            match result {
                Ok(object) => stored.push(object),
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => warn!("Additional build context upload failure under {}: {}", prefix, e),
            }
        }

        let Some(error) = first_error else {
            info!("Build context uploaded to s3://{}/{}", bucket, prefix);
            return Ok(stored);
        };

        match policy {
            BuildContextPolicy::BestEffort => {
                warn!(
                    "Build context upload under {} failed; {} file(s) left in place",
                    prefix,
                    stored.len()
                );
            }
            BuildContextPolicy::Compensating => {
                let deletions = stored
                    .iter()
                    .map(|object| self.store.delete(&object.bucket, &object.key));
                for (object, result) in stored.iter().zip(join_all(deletions).await) {
                    if let Err(e) = result {
                        warn!("Failed to roll back s3://{}/{}: {}", object.bucket, object.key, e);
                    }
                }
                warn!("Build context upload under {} failed; rolled back {} file(s)", prefix, stored.len());
            }
        }
        Err(error)
    }
}

/// Object key for a deployment package archive
pub fn package_key(agent_id: AgentId, test_id: &str) -> String {
    format!("deployments/{}/{}/deployment-package.zip", agent_id, test_id)
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_key_layout() {
        let agent_id = AgentId::from_string("6f1c2a3e-0000-4000-8000-000000000001").unwrap();
        assert_eq!(
            package_key(agent_id, "test-42"),
            "deployments/6f1c2a3e-0000-4000-8000-000000000001/test-42/deployment-package.zip"
        );
    }

    #[test]
    fn test_expiry_saturates() {
        let now = Utc::now();
        assert_eq!(expiry_after(now, Duration::from_secs(60)), now + chrono::Duration::seconds(60));
        assert_eq!(expiry_after(now, Duration::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
