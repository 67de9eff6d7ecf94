// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contracts for each aggregate root: one repository per
//! aggregate, interface defined here, implemented in
//! `crate::infrastructure::repositories`.
//!
//! | Trait | Aggregate | Implementations |
//! |-------|-----------|----------------|
//! | `AgentRepository` | `Agent` | `InMemoryAgentRepository`, `PostgresAgentRepository` |
//! | `DeploymentRepository` | `Deployment` | `InMemoryDeploymentRepository`, `PostgresDeploymentRepository` |
//! | `MemoryRepository` | `MemoryEntry` | `InMemoryMemoryRepository`, `PostgresMemoryRepository` |
//! | `PackageRepository` | `DeploymentPackage` | `InMemoryPackageRepository`, `PostgresPackageRepository` |
//!
//! Each trait exposes exactly the indexed lookups the handlers need:
//! by id, by owner, by owner and category, by public flag and by lookup
//! name. "Most recent first" always means descending `created_at`, except
//! for memory entries which order by `updated_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::agent::{Agent, AgentId};
use crate::domain::deployment::{Deployment, DeploymentId};
use crate::domain::identity::UserId;
use crate::domain::memory::{MemoryEntry, MemoryEntryId, MemoryKey};
use crate::domain::package::{DeploymentPackage, PackageId};

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Save agent (create or update)
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError>;

    /// Agents created by `owner`, most recent first
    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Agent>, RepositoryError>;

    /// Public agents, most recent first, capped at `limit`
    async fn find_public(&self, limit: usize) -> Result<Vec<Agent>, RepositoryError>;

    /// All agents flagged `exposable_as_mcp_tool`
    async fn find_exposable(&self) -> Result<Vec<Agent>, RepositoryError>;

    /// Exposable agent registered under `tool_name`. When several share a
    /// name the most recently created wins.
    async fn find_by_mcp_tool_name(&self, tool_name: &str) -> Result<Option<Agent>, RepositoryError>;

    /// Returns `true` when a row was deleted
    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn save(&self, deployment: &Deployment) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: DeploymentId) -> Result<Option<Deployment>, RepositoryError>;

    /// Deployments owned by `user`, most recent first
    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Deployment>, RepositoryError>;

    /// Deployments of one agent, most recent first
    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<Deployment>, RepositoryError>;

    async fn delete(&self, id: DeploymentId) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// Atomic upsert by composite key. Inserts `entry` when the key is
    /// new; otherwise overwrites the stored entry in place (value and
    /// `updated_at` always, metadata and ttl only when set on `entry`) and
    /// keeps its id. Returns the stored entry.
    async fn upsert(&self, entry: &MemoryEntry) -> Result<MemoryEntry, RepositoryError>;

    async fn find_by_key(&self, key: &MemoryKey) -> Result<Option<MemoryEntry>, RepositoryError>;

    /// Most recently updated entries of one category. Not TTL-aware.
    async fn find_recent_by_type(
        &self,
        user: &UserId,
        memory_type: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, RepositoryError>;

    async fn delete(&self, id: MemoryEntryId) -> Result<bool, RepositoryError>;

    /// Delete every entry of one category, returning how many were removed
    async fn delete_by_type(&self, user: &UserId, memory_type: &str) -> Result<usize, RepositoryError>;

    /// Physically remove entries whose TTL lapsed before `now`
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}

#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn save(&self, package: &DeploymentPackage) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: PackageId) -> Result<Option<DeploymentPackage>, RepositoryError>;

    /// Packages owned by `user`, most recent first
    async fn find_by_user(&self, user: &UserId) -> Result<Vec<DeploymentPackage>, RepositoryError>;

    /// Packages built from one agent, most recent first
    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<DeploymentPackage>, RepositoryError>;

    async fn delete(&self, id: PackageId) -> Result<bool, RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
