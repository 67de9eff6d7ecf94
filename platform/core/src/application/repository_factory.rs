// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Repository Factory - Application Layer
//!
//! Creates concrete repository implementations based on storage backend
//! configuration, keeping the domain layer free of infrastructure types.

use std::sync::Arc;

use sqlx::PgPool;

use crate::domain::repository::{
    AgentRepository, DeploymentRepository, MemoryRepository, PackageRepository, RepositoryError,
    StorageBackend,
};
use crate::infrastructure::repositories::postgres_agent::PostgresAgentRepository;
use crate::infrastructure::repositories::postgres_deployment::PostgresDeploymentRepository;
use crate::infrastructure::repositories::postgres_memory::PostgresMemoryRepository;
use crate::infrastructure::repositories::postgres_package::PostgresPackageRepository;
use crate::infrastructure::repositories::{
    InMemoryAgentRepository, InMemoryDeploymentRepository, InMemoryMemoryRepository,
    InMemoryPackageRepository,
};

fn require_pool(pool: Option<&PgPool>) -> Result<PgPool, RepositoryError> {
    pool.cloned().ok_or_else(|| {
        RepositoryError::Database("PostgreSQL backend selected without a connection pool".to_string())
    })
}

/// Creates an AgentRepository implementation based on the configured backend
pub fn create_agent_repository(
    backend: &StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn AgentRepository>, RepositoryError> {
    let repository: Arc<dyn AgentRepository> = match backend {
        StorageBackend::InMemory => Arc::new(InMemoryAgentRepository::new()),
        StorageBackend::PostgreSQL(_) => Arc::new(PostgresAgentRepository::new(require_pool(pool)?)),
    };
    Ok(repository)
}

/// Creates a DeploymentRepository implementation based on the configured backend
pub fn create_deployment_repository(
    backend: &StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn DeploymentRepository>, RepositoryError> {
    let repository: Arc<dyn DeploymentRepository> = match backend {
        StorageBackend::InMemory => Arc::new(InMemoryDeploymentRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresDeploymentRepository::new(require_pool(pool)?))
        }
    };
    Ok(repository)
}

/// Creates a MemoryRepository implementation based on the configured backend
pub fn create_memory_repository(
    backend: &StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn MemoryRepository>, RepositoryError> {
    let repository: Arc<dyn MemoryRepository> = match backend {
        StorageBackend::InMemory => Arc::new(InMemoryMemoryRepository::new()),
        StorageBackend::PostgreSQL(_) => Arc::new(PostgresMemoryRepository::new(require_pool(pool)?)),
    };
    Ok(repository)
}

/// Creates a PackageRepository implementation based on the configured backend
pub fn create_package_repository(
    backend: &StorageBackend,
    pool: Option<&PgPool>,
) -> Result<Arc<dyn PackageRepository>, RepositoryError> {
    let repository: Arc<dyn PackageRepository> = match backend {
        StorageBackend::InMemory => Arc::new(InMemoryPackageRepository::new()),
        StorageBackend::PostgreSQL(_) => {
            Arc::new(PostgresPackageRepository::new(require_pool(pool)?))
        }
    };
    Ok(repository)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::PostgresConfig;

    #[test]
    fn test_postgres_backend_requires_pool() {
        let backend = StorageBackend::PostgreSQL(PostgresConfig {
            connection_string: "postgres://localhost/platform".to_string(),
            max_connections: 5,
        });
        assert!(matches!(
            create_agent_repository(&backend, None),
            Err(RepositoryError::Database(_))
        ));
        assert!(create_memory_repository(&StorageBackend::InMemory, None).is_ok());
    }
}
