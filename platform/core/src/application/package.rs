// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Package Application Service
//!
//! Bookkeeping for packaged agent builds stored in the deployment bucket.
//! Packages are private to their owner. Only the owner of an agent may
//! record or publish packages for it, since archives live under the
//! agent's key prefix. Deleting a package record does not delete the
//! archive from the bucket.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::application::access::{owned_by, require_caller, visible_to};
use crate::application::artifact_storage::ArtifactStorage;
use crate::application::error::PlatformResult;
use crate::domain::agent::AgentId;
use crate::domain::clock::Clock;
use crate::domain::identity::{AuthResolver, CallerIdentity, RequestContext};
use crate::domain::package::{DeploymentPackage, NewPackage, PackageId};
use crate::domain::repository::{AgentRepository, PackageRepository};

const KIND: &str = "Deployment package";

#[async_trait]
pub trait PackageService: Send + Sync {
    /// Packages owned by the caller, most recent first. Empty when
    /// unauthenticated.
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<DeploymentPackage>>;

    /// The caller's packages built from one agent
    async fn list_by_agent(&self, ctx: &RequestContext, agent_id: AgentId) -> PlatformResult<Vec<DeploymentPackage>>;

    async fn get(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<Option<DeploymentPackage>>;

    /// Record metadata for an archive that is already in the bucket. The
    /// caller must own the agent.
    async fn create(&self, ctx: &RequestContext, draft: NewPackage) -> PlatformResult<PackageId>;

    /// Upload an archive and record it in one step. The caller must own the
    /// agent; nothing is uploaded otherwise.
    async fn publish(
        &self,
        ctx: &RequestContext,
        agent_id: AgentId,
        test_id: &str,
        archive: Bytes,
        files: Vec<String>,
    ) -> PlatformResult<PackageId>;

    /// Current download URL, re-signed when the stored one has expired
    async fn get_download_url(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<String>;

    /// Increment the download counter; returns the new count
    async fn record_download(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<u64>;

    async fn remove(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<()>;
}

pub struct StandardPackageService {
    repository: Arc<dyn PackageRepository>,
    agents: Arc<dyn AgentRepository>,
    storage: Arc<ArtifactStorage>,
    auth: Arc<dyn AuthResolver>,
    clock: Arc<dyn Clock>,
}

impl StandardPackageService {
    pub fn new(
        repository: Arc<dyn PackageRepository>,
        agents: Arc<dyn AgentRepository>,
        storage: Arc<ArtifactStorage>,
        auth: Arc<dyn AuthResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            agents,
            storage,
            auth,
            clock,
        }
    }

    async fn require_agent_owner(&self, caller: &CallerIdentity, agent_id: AgentId) -> PlatformResult<()> {
        owned_by(self.agents.find_by_id(agent_id).await?, caller, "Agent")?;
        Ok(())
    }

    async fn record(&self, caller: CallerIdentity, draft: NewPackage) -> PlatformResult<PackageId> {
        let package = DeploymentPackage::new(draft, caller.user_id, self.clock.now());
        self.repository.save(&package).await?;

        info!(
            "Deployment package {} recorded for agent {} (test: {})",
            package.id, package.agent_id, package.test_id
        );
        Ok(package.id)
    }
}

#[async_trait]
impl PackageService for StandardPackageService {
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<DeploymentPackage>> {
        let Some(caller) = self.auth.resolve_caller(ctx).await else {
            return Ok(Vec::new());
        };
        Ok(self.repository.find_by_user(&caller.user_id).await?)
    }

    async fn list_by_agent(&self, ctx: &RequestContext, agent_id: AgentId) -> PlatformResult<Vec<DeploymentPackage>> {
        let Some(caller) = self.auth.resolve_caller(ctx).await else {
            return Ok(Vec::new());
        };
        let packages = self.repository.find_by_agent(agent_id).await?;
        Ok(packages
            .into_iter()
            .filter(|p| p.user_id == caller.user_id)
            .collect())
    }

    async fn get(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<Option<DeploymentPackage>> {
        let caller = self.auth.resolve_caller(ctx).await;
        let package = self.repository.find_by_id(id).await?;
        Ok(visible_to(package, caller.as_ref()))
    }

    async fn create(&self, ctx: &RequestContext, draft: NewPackage) -> PlatformResult<PackageId> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        self.require_agent_owner(&caller, draft.agent_id).await?;
        self.record(caller, draft).await
    }

    async fn publish(
        &self,
        ctx: &RequestContext,
        agent_id: AgentId,
        test_id: &str,
        archive: Bytes,
        files: Vec<String>,
    ) -> PlatformResult<PackageId> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        self.require_agent_owner(&caller, agent_id).await?;

        let upload = self
            .storage
            .upload_deployment_package(agent_id, test_id, archive)
            .await?;

        self.record(
            caller,
            NewPackage {
                test_id: test_id.to_string(),
                agent_id,
                s3_bucket: upload.bucket,
                s3_key: upload.key,
                download_url: upload.download_url,
                url_expires_at: upload.expires_at,
                files,
            },
        )
        .await
    }

    async fn get_download_url(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<String> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let mut package = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        if package.is_url_valid_at(self.clock.now()) {
            return Ok(package.download_url);
        }

        debug!("Download URL for package {} expired, re-signing", id);
        let signed = self
            .storage
            .signed_download_url(Some(&package.s3_bucket), &package.s3_key, None)
            .await?;
        package.refresh_url(signed.url, signed.expires_at);
        self.repository.save(&package).await?;

        Ok(package.download_url)
    }

    async fn record_download(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<u64> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let mut package = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        package.record_download();
        self.repository.save(&package).await?;
        Ok(package.download_count)
    }

    async fn remove(&self, ctx: &RequestContext, id: PackageId) -> PlatformResult<()> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let package = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        self.repository.delete(package.id).await?;

        info!("Deployment package {} deleted by {}", id, caller.user_id);
        Ok(())
    }
}
