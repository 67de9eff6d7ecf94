// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::agent::AgentId;
use crate::domain::identity::UserId;
use crate::domain::package::{DeploymentPackage, PackageId};
use crate::domain::repository::{PackageRepository, RepositoryError};

const PACKAGE_COLUMNS: &str = r#"
    id, test_id, agent_id, user_id, s3_bucket, s3_key, download_url,
    url_expires_at, files, download_count, created_at
"#;

pub struct PostgresPackageRepository {
    pool: PgPool,
}

impl PostgresPackageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn package_from_row(row: &PgRow) -> Result<DeploymentPackage, RepositoryError> {
    let files_val: serde_json::Value = row.try_get("files")?;
    let files: Vec<String> = serde_json::from_value(files_val).map_err(|e| {
        RepositoryError::Serialization(format!("Failed to deserialize package files: {}", e))
    })?;

    let count: i64 = row.try_get("download_count")?;
    let download_count = u64::try_from(count)
        .map_err(|_| RepositoryError::Corrupt(format!("Negative download count: {}", count)))?;

    Ok(DeploymentPackage {
        id: PackageId(row.try_get("id")?),
        test_id: row.try_get("test_id")?,
        agent_id: AgentId(row.try_get("agent_id")?),
        user_id: UserId(row.try_get("user_id")?),
        s3_bucket: row.try_get("s3_bucket")?,
        s3_key: row.try_get("s3_key")?,
        download_url: row.try_get("download_url")?,
        url_expires_at: row.try_get("url_expires_at")?,
        files,
        download_count,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl PackageRepository for PostgresPackageRepository {
    async fn save(&self, package: &DeploymentPackage) -> Result<(), RepositoryError> {
        let files = serde_json::to_value(&package.files)?;

        sqlx::query(
            r#"
            INSERT INTO deployment_packages (
                id, test_id, agent_id, user_id, s3_bucket, s3_key, download_url,
                url_expires_at, files, download_count, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id) DO UPDATE SET
                download_url = EXCLUDED.download_url,
                url_expires_at = EXCLUDED.url_expires_at,
                files = EXCLUDED.files,
                download_count = EXCLUDED.download_count
            "#,
        )
        .bind(package.id.0)
        .bind(&package.test_id)
        .bind(package.agent_id.0)
        .bind(package.user_id.as_str())
        .bind(&package.s3_bucket)
        .bind(&package.s3_key)
        .bind(&package.download_url)
        .bind(package.url_expires_at)
        .bind(files)
        .bind(i64::try_from(package.download_count).unwrap_or(i64::MAX))
        .bind(package.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save deployment package: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: PackageId) -> Result<Option<DeploymentPackage>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM deployment_packages WHERE id = $1",
            PACKAGE_COLUMNS
        ))
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(package_from_row).transpose()
    }

    async fn find_by_user(&self, user: &UserId) -> Result<Vec<DeploymentPackage>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM deployment_packages WHERE user_id = $1 ORDER BY created_at DESC",
            PACKAGE_COLUMNS
        ))
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(package_from_row).collect()
    }

    async fn find_by_agent(&self, agent_id: AgentId) -> Result<Vec<DeploymentPackage>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM deployment_packages WHERE agent_id = $1 ORDER BY created_at DESC",
            PACKAGE_COLUMNS
        ))
        .bind(agent_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(package_from_row).collect()
    }

    async fn delete(&self, id: PackageId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM deployment_packages WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
