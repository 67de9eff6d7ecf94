// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! PostgreSQL Deployment Repository

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::agent::AgentId;
use crate::domain::deployment::{Deployment, DeploymentId, DeploymentStatus, DeploymentTier};
use crate::domain::identity::UserId;
use crate::domain::repository::{DeploymentRepository, RepositoryError};

const DEPLOYMENT_COLUMNS: &str = r#"
    id, agent_id, user_id, tier, region, status, error,
    started_at, completed_at, created_at, updated_at
"#;

pub struct PostgresDeploymentRepository {
    pool: PgPool,
}

impl PostgresDeploymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn deployment_from_row(row: &PgRow) -> Result<Deployment, RepositoryError> {
    let tier_str: String = row.try_get("tier")?;
    let status_str: String = row.try_get("status")?;

    let tier = DeploymentTier::parse(&tier_str)
        .ok_or_else(|| RepositoryError::Corrupt(format!("Unknown deployment tier: {}", tier_str)))?;
    let status = DeploymentStatus::parse(&status_str)
        .ok_or_else(|| RepositoryError::Corrupt(format!("Unknown deployment status: {}", status_str)))?;

    Ok(Deployment {
        id: DeploymentId(row.try_get("id")?),
        agent_id: AgentId(row.try_get("agent_id")?),
        user_id: UserId(row.try_get("user_id")?),
        tier,
        region: row.try_get("region")?,
        status,
        error: row.try_get("error")?,
        started_at: row.try_get("started_at")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl DeploymentRepository for PostgresDeploymentRepository {
    async fn save(&self, deployment: &Deployment) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO deployments (
                id, agent_id, user_id, tier, region, status, error,
                started_at, completed_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                error = EXCLUDED.error,
                started_at = EXCLUDED.started_at,
                completed_at = EXCLUDED.completed_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(deployment.id.0)
        .bind(deployment.agent_id.0)
        .bind(deployment.user_id.as_str())
        .bind(deployment.tier.as_str())
        .bind(&deployment.region)
        .bind(deployment.status.as_str())
        .bind(&deployment.error)
        .bind(deployment.started_at)
        .bind(deployment.completed_at)
        .bind(deployment.created_at)
        .bind(deployment.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save deployment: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: DeploymentId) -> Result<Option<Deployment>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM deployments WHERE id = $1",
            DEPLOYMENT_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(deployment_from_row).transpose()
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<Deployment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM deployments WHERE user_id = $1 ORDER BY created_at DESC",
            DEPLOYMENT_COLUMNS
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(deployment_from_row).collect()
    }

    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<Deployment>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM deployments WHERE agent_id = $1 ORDER BY created_at DESC",
            DEPLOYMENT_COLUMNS
        ))
        .bind(agent_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(deployment_from_row).collect()
    }

    async fn delete(&self, id: DeploymentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM deployments WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
