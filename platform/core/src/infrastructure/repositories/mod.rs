// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the repository traits defined in
//! `crate::domain::repository`.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve domain aggregates
//! - **Pattern:** Repository (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! ## PostgreSQL Repositories
//!
//! - **PostgresAgentRepository** - `agents` table
//! - **PostgresDeploymentRepository** - `deployments` table
//! - **PostgresMemoryRepository** - `tool_memory` table
//! - **PostgresPackageRepository** - `deployment_packages` table
//!
//! ## In-Memory Repositories
//!
//! Thread-safe HashMap-backed storage for development and tests. Ordering
//! and filtering mirror the indexed queries of the PostgreSQL versions.

pub mod postgres_agent;
pub mod postgres_deployment;
pub mod postgres_memory;
pub mod postgres_package;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::agent::{Agent, AgentId};
use crate::domain::deployment::{Deployment, DeploymentId};
use crate::domain::identity::UserId;
use crate::domain::memory::{MemoryEntry, MemoryEntryId, MemoryKey};
use crate::domain::package::{DeploymentPackage, PackageId};
use crate::domain::repository::{
    AgentRepository, DeploymentRepository, MemoryRepository, PackageRepository, RepositoryError,
};

#[derive(Clone, Default)]
pub struct InMemoryAgentRepository {
    agents: Arc<RwLock<HashMap<AgentId, Agent>>>,
}

impl InMemoryAgentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError> {
        self.agents.write().insert(agent.id, agent.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        Ok(self.agents.read().get(&id).cloned())
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.read();
        let mut owned: Vec<Agent> = agents
            .values()
            .filter(|a| &a.created_by == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_public(&self, limit: usize) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.read();
        let mut public: Vec<Agent> = agents.values().filter(|a| a.is_public).cloned().collect();
        public.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        public.truncate(limit);
        Ok(public)
    }

    async fn find_exposable(&self) -> Result<Vec<Agent>, RepositoryError> {
        let agents = self.agents.read();
        let mut exposable: Vec<Agent> = agents
            .values()
            .filter(|a| a.exposable_as_mcp_tool)
            .cloned()
            .collect();
        exposable.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(exposable)
    }

    async fn find_by_mcp_tool_name(&self, tool_name: &str) -> Result<Option<Agent>, RepositoryError> {
        let agents = self.agents.read();
        Ok(agents
            .values()
            .filter(|a| a.exposable_as_mcp_tool && a.mcp_tool_name.as_deref() == Some(tool_name))
            .max_by_key(|a| a.created_at)
            .cloned())
    }

    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError> {
        Ok(self.agents.write().remove(&id).is_some())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryDeploymentRepository {
    deployments: Arc<RwLock<HashMap<DeploymentId, Deployment>>>,
}

impl InMemoryDeploymentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DeploymentRepository for InMemoryDeploymentRepository {
    async fn save(&self, deployment: &Deployment) -> Result<(), RepositoryError> {
        self.deployments.write().insert(deployment.id, deployment.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: DeploymentId) -> Result<Option<Deployment>, RepositoryError> {
        Ok(self.deployments.read().get(&id).cloned())
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Deployment>, RepositoryError> {
        let deployments = self.deployments.read();
        let mut owned: Vec<Deployment> = deployments
            .values()
            .filter(|d| &d.user_id == user)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<Deployment>, RepositoryError> {
        let deployments = self.deployments.read();
        let mut matching: Vec<Deployment> = deployments
            .values()
            .filter(|d| d.agent_id == agent_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn delete(&self, id: DeploymentId) -> Result<bool, RepositoryError> {
        Ok(self.deployments.write().remove(&id).is_some())
    }
}

/// Entries by id plus a composite-key index, mirroring the unique
/// `(user_id, memory_type, key)` index of the SQL table.
#[derive(Default)]
struct MemoryTable {
    entries: HashMap<MemoryEntryId, MemoryEntry>,
    by_key: HashMap<MemoryKey, MemoryEntryId>,
}

impl MemoryTable {
    fn remove(&mut self, id: MemoryEntryId) -> Option<MemoryEntry> {
        let entry = self.entries.remove(&id)?;
        self.by_key.remove(&entry.memory_key());
        Some(entry)
    }

    fn remove_where(&mut self, predicate: impl Fn(&MemoryEntry) -> bool) -> usize {
        let doomed: Vec<MemoryEntryId> = self
            .entries
            .values()
            .filter(|e| predicate(*e))
            .map(|e| e.id)
            .collect();
        for id in &doomed {
            self.remove(*id);
        }
        doomed.len()
    }
}

#[derive(Clone, Default)]
pub struct InMemoryMemoryRepository {
    table: Arc<RwLock<MemoryTable>>,
}

impl InMemoryMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of physically stored entries, expired ones included
    pub fn stored_len(&self) -> usize {
        self.table.read().entries.len()
    }
}

#[async_trait]
impl MemoryRepository for InMemoryMemoryRepository {
    async fn upsert(&self, entry: &MemoryEntry) -> Result<MemoryEntry, RepositoryError> {
        let mut table = self.table.write();
        let key = entry.memory_key();

        if let Some(id) = table.by_key.get(&key).copied() {
            if let Some(stored) = table.entries.get_mut(&id) {
                stored.overwrite(
                    entry.value.clone(),
                    entry.metadata.clone(),
                    entry.ttl,
                    entry.updated_at,
                );
                return Ok(stored.clone());
            }
        }

        table.by_key.insert(key, entry.id);
        table.entries.insert(entry.id, entry.clone());
        Ok(entry.clone())
    }

    async fn find_by_key(&self, key: &MemoryKey) -> Result<Option<MemoryEntry>, RepositoryError> {
        let table = self.table.read();
        Ok(table
            .by_key
            .get(key)
            .and_then(|id| table.entries.get(id))
            .cloned())
    }

    async fn find_recent_by_type(
        &self,
        user: &UserId,
        memory_type: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, RepositoryError> {
        let table = self.table.read();
        let mut entries: Vec<MemoryEntry> = table
            .entries
            .values()
            .filter(|e| &e.user_id == user && e.memory_type == memory_type)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        entries.truncate(limit);
        Ok(entries)
    }

    async fn delete(&self, id: MemoryEntryId) -> Result<bool, RepositoryError> {
        Ok(self.table.write().remove(id).is_some())
    }

    async fn delete_by_type(&self, user: &UserId, memory_type: &str) -> Result<usize, RepositoryError> {
        let mut table = self.table.write();
        Ok(table.remove_where(|e| &e.user_id == user && e.memory_type == memory_type))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let mut table = self.table.write();
        Ok(table.remove_where(|e| e.is_expired_at(now)))
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPackageRepository {
    packages: Arc<RwLock<HashMap<PackageId, DeploymentPackage>>>,
}

impl InMemoryPackageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageRepository for InMemoryPackageRepository {
    async fn save(&self, package: &DeploymentPackage) -> Result<(), RepositoryError> {
        self.packages.write().insert(package.id, package.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: PackageId) -> Result<Option<DeploymentPackage>, RepositoryError> {
        Ok(self.packages.read().get(&id).cloned())
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<DeploymentPackage>, RepositoryError> {
        let packages = self.packages.read();
        let mut owned: Vec<DeploymentPackage> = packages
            .values()
            .filter(|p| &p.user_id == user)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<DeploymentPackage>, RepositoryError> {
        let packages = self.packages.read();
        let mut matching: Vec<DeploymentPackage> = packages
            .values()
            .filter(|p| p.agent_id == agent_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn delete(&self, id: PackageId) -> Result<bool, RepositoryError> {
        Ok(self.packages.write().remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::agent::NewAgent;
    use chrono::Duration;

    fn agent(owner: &str, name: &str, at: DateTime<Utc>) -> Agent {
        Agent::new(
            NewAgent {
                name: name.to_string(),
                model: "llama3".to_string(),
                system_prompt: "prompt".to_string(),
                ..Default::default()
            },
            UserId::new(owner),
            at,
        )
    }

    #[tokio::test]
    async fn test_public_agents_are_capped_and_recent_first() {
        let repo = InMemoryAgentRepository::new();
        let t0 = Utc::now();
        for i in 0..25 {
            let mut a = agent("u1", &format!("agent-{}", i), t0 + Duration::seconds(i));
            a.is_public = true;
            repo.save(&a).await.unwrap();
        }

        let public = repo.find_public(20).await.unwrap();
        assert_eq!(public.len(), 20);
        assert_eq!(public[0].name, "agent-24");
        assert_eq!(public[19].name, "agent-5");
    }

    #[tokio::test]
    async fn test_tool_name_lookup_requires_exposable() {
        let repo = InMemoryAgentRepository::new();
        let mut a = agent("u1", "searcher", Utc::now());
        a.mcp_tool_name = Some("search".to_string());
        repo.save(&a).await.unwrap();

        assert!(repo.find_by_mcp_tool_name("search").await.unwrap().is_none());

        a.exposable_as_mcp_tool = true;
        repo.save(&a).await.unwrap();
        assert_eq!(repo.find_by_mcp_tool_name("search").await.unwrap().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_memory_upsert_reuses_entry_for_same_key() {
        let repo = InMemoryMemoryRepository::new();
        let key = MemoryKey::new(UserId::new("u1"), "short", "k");
        let t0 = Utc::now();
        let first = MemoryEntry::new(key.clone(), "a".to_string(), None, Some(10), t0);
        let second = MemoryEntry::new(key, "b".to_string(), None, None, t0 + Duration::seconds(1));

        assert_eq!(repo.upsert(&first).await.unwrap().id, first.id);
        let stored = repo.upsert(&second).await.unwrap();

        assert_eq!(stored.id, first.id);
        assert_eq!(stored.value, "b");
        assert_eq!(stored.ttl, Some(10));
        assert_eq!(stored.created_at, t0);
        assert_eq!(repo.stored_len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_of_new_key_converge() {
        let repo = Arc::new(InMemoryMemoryRepository::new());
        let key = MemoryKey::new(UserId::new("u1"), "short", "k");

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let repo = repo.clone();
                let entry = MemoryEntry::new(key.clone(), format!("v{}", i), None, None, Utc::now());
                tokio::spawn(async move { repo.upsert(&entry).await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
        assert_eq!(repo.stored_len(), 1);
    }

    #[tokio::test]
    async fn test_memory_delete_keeps_index_consistent() {
        let repo = InMemoryMemoryRepository::new();
        let key = MemoryKey::new(UserId::new("u1"), "short", "k");
        let entry = MemoryEntry::new(key.clone(), "a".to_string(), None, None, Utc::now());
        repo.upsert(&entry).await.unwrap();

        assert!(repo.delete(entry.id).await.unwrap());
        assert!(repo.find_by_key(&key).await.unwrap().is_none());

        let replacement = MemoryEntry::new(key.clone(), "b".to_string(), None, None, Utc::now());
        assert_eq!(repo.upsert(&replacement).await.unwrap().id, replacement.id);
        assert_eq!(repo.find_by_key(&key).await.unwrap().unwrap().value, "b");
    }
}
