// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent Application Service
//!
//! Record handlers for agents. Every operation is one authorization step
//! followed by one repository call:
//!
//! - reads return `None` for records the caller may not see, so a private
//!   agent is indistinguishable from a missing one;
//! - writes require the caller to own the record;
//! - `created_by` is always the resolved caller.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::application::access::{owned_by, require_caller, visible_to};
use crate::application::error::PlatformResult;
use crate::domain::agent::{tool_name_slug, Agent, AgentId, AgentPatch, McpToolDescriptor, NewAgent};
use crate::domain::clock::Clock;
use crate::domain::identity::{AuthResolver, RequestContext};
use crate::domain::repository::AgentRepository;

/// Number of agents returned by `list_public`
pub const PUBLIC_AGENT_LIMIT: usize = 20;

const KIND: &str = "Agent";

#[async_trait]
pub trait AgentService: Send + Sync {
    /// Agents owned by the caller, most recent first. Empty when
    /// unauthenticated.
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<Agent>>;

    /// Most recent public agents; no authentication required
    async fn list_public(&self) -> PlatformResult<Vec<Agent>>;

    async fn get(&self, ctx: &RequestContext, id: AgentId) -> PlatformResult<Option<Agent>>;

    async fn create(&self, ctx: &RequestContext, draft: NewAgent) -> PlatformResult<AgentId>;

    async fn update(&self, ctx: &RequestContext, id: AgentId, patch: AgentPatch) -> PlatformResult<()>;

    async fn remove(&self, ctx: &RequestContext, id: AgentId) -> PlatformResult<()>;

    /// Every exposable agent projected into an MCP tool descriptor
    async fn list_exposable(&self) -> PlatformResult<Vec<McpToolDescriptor>>;

    /// Exposable agent registered under an MCP tool name
    async fn get_by_mcp_tool_name(&self, tool_name: &str) -> PlatformResult<Option<Agent>>;
}

pub struct StandardAgentService {
    repository: Arc<dyn AgentRepository>,
    auth: Arc<dyn AuthResolver>,
    clock: Arc<dyn Clock>,
}

impl StandardAgentService {
    pub fn new(
        repository: Arc<dyn AgentRepository>,
        auth: Arc<dyn AuthResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            auth,
            clock,
        }
    }
}

#[async_trait]
impl AgentService for StandardAgentService {
    async fn list(&self, ctx: &RequestContext) -> PlatformResult<Vec<Agent>> {
        let Some(caller) = self.auth.resolve_caller(ctx).await else {
            return Ok(Vec::new());
        };
        debug!("Listing agents for {}", caller.user_id);
        Ok(self.repository.find_by_owner(&caller.user_id).await?)
    }

    async fn list_public(&self) -> PlatformResult<Vec<Agent>> {
        Ok(self.repository.find_public(PUBLIC_AGENT_LIMIT).await?)
    }

    async fn get(&self, ctx: &RequestContext, id: AgentId) -> PlatformResult<Option<Agent>> {
        let caller = self.auth.resolve_caller(ctx).await;
        let agent = self.repository.find_by_id(id).await?;
        Ok(visible_to(agent, caller.as_ref()))
    }

    async fn create(&self, ctx: &RequestContext, draft: NewAgent) -> PlatformResult<AgentId> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let agent = Agent::new(draft, caller.user_id, self.clock.now());
        self.repository.save(&agent).await?;

        info!("Agent '{}' created (id: {}, owner: {})", agent.name, agent.id, agent.created_by);
        Ok(agent.id)
    }

    async fn update(&self, ctx: &RequestContext, id: AgentId, patch: AgentPatch) -> PlatformResult<()> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let mut agent = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        agent.apply(patch, self.clock.now());
        self.repository.save(&agent).await?;

        debug!("Agent {} updated by {}", id, caller.user_id);
        Ok(())
    }

    async fn remove(&self, ctx: &RequestContext, id: AgentId) -> PlatformResult<()> {
        let caller = require_caller(self.auth.as_ref(), ctx).await?;
        let agent = owned_by(self.repository.find_by_id(id).await?, &caller, KIND)?;

        self.repository.delete(agent.id).await?;

        info!("Agent {} deleted by {}", id, caller.user_id);
        Ok(())
    }

    async fn list_exposable(&self) -> PlatformResult<Vec<McpToolDescriptor>> {
        let agents = self.repository.find_exposable().await?;
        Ok(agents.iter().filter_map(Agent::tool_descriptor).collect())
    }

    async fn get_by_mcp_tool_name(&self, tool_name: &str) -> PlatformResult<Option<Agent>> {
        if let Some(agent) = self.repository.find_by_mcp_tool_name(tool_name).await? {
            return Ok(Some(agent));
        }

        // Agents without an explicit tool name are listed under their slug.
        let agents = self.repository.find_exposable().await?;
        Ok(agents.into_iter().find(|a| {
            a.mcp_tool_name.as_deref().map_or(true, |n| n.trim().is_empty())
                && tool_name_slug(&a.name) == tool_name
        }))
    }
}
