// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Composition root
//!
//! Wires repositories, object storage, caller resolution and the clock into
//! the handler services. Hosts build one [`Platform`] at startup and share
//! it across requests.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::agent::{AgentService, StandardAgentService};
use crate::application::artifact_storage::ArtifactStorage;
use crate::application::deployment::{DeploymentService, StandardDeploymentService};
use crate::application::memory::{MemoryService, StandardMemoryService};
use crate::application::package::{PackageService, StandardPackageService};
use crate::application::repository_factory::{
    create_agent_repository, create_deployment_repository, create_memory_repository,
    create_package_repository,
};
use crate::config::{ConfigError, PlatformConfig, StorageConfig};
use crate::domain::clock::{Clock, SystemClock};
use crate::domain::identity::AuthResolver;
use crate::domain::repository::{
    AgentRepository, DeploymentRepository, MemoryRepository, PackageRepository, StorageBackend,
};
use crate::domain::storage::ObjectStore;
use crate::infrastructure::auth::{JwtAuthResolver, StaticAuthResolver};
use crate::infrastructure::db::Database;
use crate::infrastructure::repositories::{
    InMemoryAgentRepository, InMemoryDeploymentRepository, InMemoryMemoryRepository,
    InMemoryPackageRepository,
};
use crate::infrastructure::storage::{create_object_store, ObjectStoreBackend};

/// Repository handles shared by the services
#[derive(Clone)]
pub struct Repositories {
    pub agents: Arc<dyn AgentRepository>,
    pub deployments: Arc<dyn DeploymentRepository>,
    pub memory: Arc<dyn MemoryRepository>,
    pub packages: Arc<dyn PackageRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            agents: Arc::new(InMemoryAgentRepository::new()),
            deployments: Arc::new(InMemoryDeploymentRepository::new()),
            memory: Arc::new(InMemoryMemoryRepository::new()),
            packages: Arc::new(InMemoryPackageRepository::new()),
        }
    }
}

pub struct Platform {
    pub agents: Arc<dyn AgentService>,
    pub deployments: Arc<dyn DeploymentService>,
    pub packages: Arc<dyn PackageService>,
    pub memory: Arc<dyn MemoryService>,
    pub storage: Arc<ArtifactStorage>,
    database: Option<Database>,
}

impl Platform {
    /// Build every service from pre-constructed collaborators
    pub fn assemble(
        repositories: Repositories,
        store: Arc<dyn ObjectStore>,
        storage_config: StorageConfig,
        auth: Arc<dyn AuthResolver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let storage = Arc::new(ArtifactStorage::new(store, storage_config, clock.clone())?);

        Ok(Self {
            agents: Arc::new(StandardAgentService::new(
                repositories.agents.clone(),
                auth.clone(),
                clock.clone(),
            )),
            deployments: Arc::new(StandardDeploymentService::new(
                repositories.deployments,
                repositories.agents.clone(),
                auth.clone(),
                clock.clone(),
            )),
            packages: Arc::new(StandardPackageService::new(
                repositories.packages,
                repositories.agents,
                storage.clone(),
                auth,
                clock.clone(),
            )),
            memory: Arc::new(StandardMemoryService::new(repositories.memory, clock)),
            storage,
            database: None,
        })
    }

    /// Everything in process memory; used by tests and local development
    pub fn in_memory(
        store: Arc<dyn ObjectStore>,
        storage_config: StorageConfig,
        auth: Arc<dyn AuthResolver>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        Self::assemble(Repositories::in_memory(), store, storage_config, auth, clock)
    }

    /// Build the platform from validated configuration: connect and migrate
    /// PostgreSQL when a database URL is set, bind the S3 store, and pick
    /// JWT caller resolution when a secret is configured.
    pub async fn from_config(config: PlatformConfig) -> Result<Self> {
        config.validate().context("Invalid platform configuration")?;

        let backend = config.database.storage_backend();
        let database = match &backend {
            StorageBackend::PostgreSQL(pg) => {
                let db = Database::new(pg).await?;
                db.migrate().await?;
                Some(db)
            }
            StorageBackend::InMemory => {
                warn!("No database configured; records are kept in memory only");
                None
            }
        };
        let pool = database.as_ref().map(Database::get_pool);
        info!("Record store backend: {}", backend_name(&backend));

        let repositories = Repositories {
            agents: create_agent_repository(&backend, pool)?,
            deployments: create_deployment_repository(&backend, pool)?,
            memory: create_memory_repository(&backend, pool)?,
            packages: create_package_repository(&backend, pool)?,
        };

        let auth: Arc<dyn AuthResolver> = match JwtAuthResolver::from_config(&config.auth) {
            Some(resolver) => Arc::new(resolver),
            None => {
                warn!("No auth.jwt_secret configured; every request resolves as anonymous");
                Arc::new(StaticAuthResolver::new())
            }
        };

        let store = create_object_store(ObjectStoreBackend::S3(config.storage.clone()));
        let mut platform = Self::assemble(
            repositories,
            store,
            config.storage,
            auth,
            Arc::new(SystemClock),
        )?;
        platform.database = database;
        Ok(platform)
    }

    pub fn database(&self) -> Option<&Database> {
        self.database.as_ref()
    }
}

fn backend_name(backend: &StorageBackend) -> &'static str {
    match backend {
        StorageBackend::InMemory => "in-memory",
        StorageBackend::PostgreSQL(_) => "postgresql",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::identity::RequestContext;

    #[tokio::test]
    async fn test_from_default_config_is_in_memory_and_anonymous() {
        let platform = Platform::from_config(PlatformConfig::default()).await.unwrap();

        assert!(platform.database().is_none());
        let agents = platform.agents.list(&RequestContext::with_bearer("anything")).await.unwrap();
        assert!(agents.is_empty());
    }

    #[tokio::test]
    async fn test_from_config_rejects_invalid_storage() {
        let mut config = PlatformConfig::default();
        config.storage.access_key_id = Some("AKID".to_string());

        assert!(Platform::from_config(config).await.is_err());
    }
}
