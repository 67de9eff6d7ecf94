// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Tool Memory Repository
//!
//! Backs the TTL key-value store with the `tool_memory` table. Upserts
//! resolve conflicts on the unique `(user_id, memory_type, key)` triple in
//! a single statement, so concurrent stores of a new key converge on one
//! row.
//!
//! Expiry is evaluated lazily by the service; [`delete_expired`] only
//! reclaims space and uses the same strict comparison
//! (`updated_at + ttl < now`).
//!
//! [`delete_expired`]: MemoryRepository::delete_expired

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::identity::UserId;
use crate::domain::memory::{MemoryEntry, MemoryEntryId, MemoryKey, MAX_TTL_SECONDS};
use crate::domain::repository::{MemoryRepository, RepositoryError};

const MEMORY_COLUMNS: &str =
    "id, user_id, memory_type, key, value, metadata, ttl, created_at, updated_at";

pub struct PostgresMemoryRepository {
    pool: PgPool,
}

impl PostgresMemoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn entry_from_row(row: &PgRow) -> Result<MemoryEntry, RepositoryError> {
    let ttl: Option<i64> = row.try_get("ttl")?;
    let ttl = ttl
        .map(|secs| {
            u64::try_from(secs)
                .map_err(|_| RepositoryError::Corrupt(format!("Negative memory ttl: {}", secs)))
        })
        .transpose()?;

    Ok(MemoryEntry {
        id: MemoryEntryId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        memory_type: row.try_get("memory_type")?,
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        metadata: row.try_get("metadata")?,
        ttl,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn ttl_to_db(ttl: Option<u64>) -> Result<Option<i64>, RepositoryError> {
    ttl.map(|secs| {
        if secs > MAX_TTL_SECONDS {
            return Err(RepositoryError::Serialization(format!(
                "Memory ttl {}s exceeds {}s",
                secs, MAX_TTL_SECONDS
            )));
        }
        i64::try_from(secs).map_err(|e| RepositoryError::Serialization(e.to_string()))
    })
    .transpose()
}

#[async_trait]
impl MemoryRepository for PostgresMemoryRepository {
    async fn upsert(&self, entry: &MemoryEntry) -> Result<MemoryEntry, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tool_memory (
                id, user_id, memory_type, key, value, metadata, ttl, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id, memory_type, key) DO UPDATE SET
                value = EXCLUDED.value,
                metadata = COALESCE(EXCLUDED.metadata, tool_memory.metadata),
                ttl = COALESCE(EXCLUDED.ttl, tool_memory.ttl),
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            MEMORY_COLUMNS
        ))
        .bind(entry.id.0)
        .bind(entry.user_id.as_str())
        .bind(&entry.memory_type)
        .bind(&entry.key)
        .bind(&entry.value)
        .bind(&entry.metadata)
        .bind(ttl_to_db(entry.ttl)?)
        .bind(entry.created_at)
        .bind(entry.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to upsert memory entry: {}", e)))?;

        entry_from_row(&row)
    }

    async fn find_by_key(&self, key: &MemoryKey) -> Result<Option<MemoryEntry>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tool_memory WHERE user_id = $1 AND memory_type = $2 AND key = $3",
            MEMORY_COLUMNS
        ))
        .bind(key.user_id.as_str())
        .bind(&key.memory_type)
        .bind(&key.key)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn find_recent_by_type(
        &self,
        user: &UserId,
        memory_type: &str,
        limit: usize,
    ) -> Result<Vec<MemoryEntry>, RepositoryError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {} FROM tool_memory
            WHERE user_id = $1 AND memory_type = $2
            ORDER BY updated_at DESC
            LIMIT $3
            "#,
            MEMORY_COLUMNS
        ))
        .bind(user.as_str())
        .bind(memory_type)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }

    async fn delete(&self, id: MemoryEntryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tool_memory WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_type(&self, user: &UserId, memory_type: &str) -> Result<usize, RepositoryError> {
        let result = sqlx::query("DELETE FROM tool_memory WHERE user_id = $1 AND memory_type = $2")
            .bind(user.as_str())
            .bind(memory_type)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() as usize)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM tool_memory
            WHERE ttl IS NOT NULL
              AND updated_at + ttl * INTERVAL '1 second' < $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_binding_is_bounded() {
        assert_eq!(ttl_to_db(None).unwrap(), None);
        assert_eq!(ttl_to_db(Some(3_600)).unwrap(), Some(3_600));
        assert_eq!(
            ttl_to_db(Some(MAX_TTL_SECONDS)).unwrap(),
            Some(MAX_TTL_SECONDS as i64)
        );
        assert!(matches!(
            ttl_to_db(Some(u64::MAX)),
            Err(RepositoryError::Serialization(_))
        ));
    }
}
