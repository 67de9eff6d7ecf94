// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Deployment package bookkeeping.
//!
//! A package is a zipped build of a tested agent stored in the deployment
//! bucket. The record keeps a pre-signed download URL which must be
//! treated as invalid after `url_expires_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::identity::UserId;
use crate::domain::ownership::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackageId(pub Uuid);

impl PackageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for PackageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPackage {
    pub id: PackageId,
    /// Test execution the package was built from
    pub test_id: String,
    pub agent_id: AgentId,
    pub user_id: UserId,
    pub s3_bucket: String,
    pub s3_key: String,
    pub download_url: String,
    pub url_expires_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<String>,
    pub download_count: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPackage {
    pub test_id: String,
    pub agent_id: AgentId,
    pub s3_bucket: String,
    pub s3_key: String,
    pub download_url: String,
    pub url_expires_at: DateTime<Utc>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl DeploymentPackage {
    pub fn new(draft: NewPackage, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: PackageId::new(),
            test_id: draft.test_id,
            agent_id: draft.agent_id,
            user_id: owner,
            s3_bucket: draft.s3_bucket,
            s3_key: draft.s3_key,
            download_url: draft.download_url,
            url_expires_at: draft.url_expires_at,
            files: draft.files,
            download_count: 0,
            created_at: now,
        }
    }

    pub fn is_url_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.url_expires_at
    }

    pub fn refresh_url(&mut self, url: String, expires_at: DateTime<Utc>) {
        self.download_url = url;
        self.url_expires_at = expires_at;
    }

    pub fn record_download(&mut self) {
        self.download_count = self.download_count.saturating_add(1);
    }
}

impl Owned for DeploymentPackage {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_url_validity_window() {
        let now = Utc::now();
        let package = DeploymentPackage::new(
            NewPackage {
                test_id: "test-1".to_string(),
                agent_id: AgentId::new(),
                s3_bucket: "bucket".to_string(),
                s3_key: "key.zip".to_string(),
                download_url: "https://example.invalid/key.zip".to_string(),
                url_expires_at: now + Duration::hours(24),
                files: vec!["agent.py".to_string()],
            },
            UserId::new("user-a"),
            now,
        );

        assert!(package.is_url_valid_at(now));
        assert!(package.is_url_valid_at(now + Duration::hours(24)));
        assert!(!package.is_url_valid_at(now + Duration::hours(24) + Duration::seconds(1)));
        assert_eq!(package.download_count, 0);
    }
}
