// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Deployment Application Service
//!
//! Record handlers for deployments. Deployments are private to their
//! owner; status changes go through the aggregate's forward-only
//! transition table.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::access::{owned_by, require_caller, visible_to};
use crate::application::error::{PlatformError, PlatformResult};
use crate::domain::agent::AgentId;
use crate::domain::clock::Clock;
use crate::domain::deployment::{Deployment, DeploymentId, DeploymentPatch, NewDeployment};
use crate::domain::identity::{AuthResolver, RequestContext};
use crate::domain::repository::{AgentRepository, DeploymentRepository};

const KIND: &str = "Deployment";

#[async_trait]
pub trait DeploymentService: Send + Sync {
    /// Deployments owned by the caller, most recent first. Empty when
    /// unauthenticated.
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<Deployment>>;

    /// The caller's deployments of one agent
    async fn list_by_agent(&self, ctx: &RequestContext, agent_id: AgentId) -> PlatformResult<Vec<Deployment>>;

    async fn get(&self, ctx: &RequestContext, id: DeploymentId) -> PlatformResult<Option<Deployment>>;

    /// Create a deployment of an agent the caller can see
    async fn create(&self, ctx: &RequestContext, request: NewDeployment) -> PlatformResult<DeploymentId>;

    async fn update(&self, ctx: &RequestContext, id: DeploymentId, patch: DeploymentPatch) -> PlatformResult<()>;

    async fn remove(&self, ctx: &RequestContext, id: DeploymentId) -> PlatformResult<()>;
}

pub struct StandardDeploymentService {
    repository: Arc<dyn DeploymentRepository>,
    agents: Arc<dyn AgentRepository>,
    auth: Arc<dyn AuthResolver>,
    clock: Arc<dyn Clock>,
}

impl StandardDeploymentService {
    pub fn new(
        repository: Arc<dyn DeploymentRepository>,
        agents: Arc<dyn AgentRepository>,
        auth: Arc<dyn AuthResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            agents,
            auth,
            clock,
        }
    }
}

#[async_trait]
impl DeploymentService for StandardDeploymentService {
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<Deployment>> {
        let Some(caller) = self.auth.resolve_caller(ctx).await else {
            return Ok(Vec::new());
        };
        Ok(self.repository.find_by_user(&caller.user_id).await?)
    }

    async fn list_by_agent(&self, ctx: &RequestContext, agent_id: AgentId) -> PlatformResult<Vec<Deployment>> {
        let Some(caller) = self.auth.resolve_caller(ctx).await else {
            return Ok(Vec::new());
        };
        let deployments = self.repository.find_by_agent(agent_id).await?;
        Ok(deployments
            .into_iter()
            .filter(|d| d.user_id == caller.user_id)
            .collect())
    }

    async fn get(&self, ctx: &RequestContext, id: DeploymentId) -> PlatformResult<Option<Deployment>> {
        let caller = self.auth.resolve_caller(ctx).await;
        let deployment = self.repository.find_by_id(id).await?;
        Ok(visible_to(deployment, caller.as_ref()))
    }

    async fn create(&self, ctx: &RequestContext, request: NewDeployment) -> PlatformResult<DeploymentId> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;

        let agent = self.agents.find_by_id(request.agent_id).await?;
        if visible_to(agent, Some(&caller)).is_none() {
            return Err(PlatformError::NotFoundOrForbidden("Agent"));
        }

        let deployment = Deployment::new(request, caller.user_id, self.clock.now());
        self.repository.save(&deployment).await?;

        info!(
            "Deployment {} created for agent {} (tier: {}, region: {})",
            deployment.id,
            deployment.agent_id,
            deployment.tier.as_str(),
            deployment.region
        );
        Ok(deployment.id)
    }

    async fn update(&self, ctx: &RequestContext, id: DeploymentId, patch: DeploymentPatch) -> PlatformResult<()> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let mut deployment = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        let previous = deployment.status;
        deployment.apply(patch, self.clock.now())?;
        self.repository.save(&deployment).await?;

        if previous != deployment.status {
            info!("Deployment {} status {} -> {}", id, previous, deployment.status);
        } else {
            debug!("Deployment {} updated", id);
        }
        Ok(())
    }

    async fn remove(&self, ctx: &RequestContext, id: DeploymentId) -> PlatformResult<()> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let deployment = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        self.repository.delete(deployment.id).await?;

        info!("Deployment {} deleted by {}", id, caller.user_id);
        Ok(())
    }
}
