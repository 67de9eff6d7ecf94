// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Agent Repository
//!
//! `AgentRepository` backed by the `agents` table. Tools are stored as a
//! JSONB array; the MCP tool name is served from a partial index over
//! exposable agents.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;

use crate::domain::agent::{Agent, AgentId, AgentTool};
use crate::domain::identity::UserId;
use crate::domain::repository::{AgentRepository, RepositoryError};

const AGENT_COLUMNS: &str = r#"
    id, name, description, model, system_prompt, tools, generated_code,
    is_public, exposable_as_mcp_tool, mcp_tool_name, mcp_input_schema,
    created_by, created_at, updated_at
"#;

pub struct PostgresAgentRepository {
    pool: PgPool,
}

impl PostgresAgentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn agent_from_row(row: &PgRow) -> Result<Agent, RepositoryError> {
    let tools_val: serde_json::Value = row.try_get("tools")?;
    let tools: Vec<AgentTool> = serde_json::from_value(tools_val)
        .map_err(|e| RepositoryError::Serialization(format!("Failed to deserialize agent tools: {}", e)))?;

    Ok(Agent {
        id: AgentId(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        model: row.try_get("model")?,
        system_prompt: row.try_get("system_prompt")?,
        tools,
        generated_code: row.try_get("generated_code")?,
        is_public: row.try_get("is_public")?,
        exposable_as_mcp_tool: row.try_get("exposable_as_mcp_tool")?,
        mcp_tool_name: row.try_get("mcp_tool_name")?,
        mcp_input_schema: row.try_get("mcp_input_schema")?,
        created_by: UserId(row.try_get("created_by")?),
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl AgentRepository for PostgresAgentRepository {
    async fn save(&self, agent: &Agent) -> Result<(), RepositoryError> {
        let tools = serde_json::to_value(&agent.tools)?;

        sqlx::query(
            r#"
            INSERT INTO agents (
                id, name, description, model, system_prompt, tools, generated_code,
                is_public, exposable_as_mcp_tool, mcp_tool_name, mcp_input_schema,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                model = EXCLUDED.model,
                system_prompt = EXCLUDED.system_prompt,
                tools = EXCLUDED.tools,
                generated_code = EXCLUDED.generated_code,
                is_public = EXCLUDED.is_public,
                exposable_as_mcp_tool = EXCLUDED.exposable_as_mcp_tool,
                mcp_tool_name = EXCLUDED.mcp_tool_name,
                mcp_input_schema = EXCLUDED.mcp_input_schema,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(agent.id.0)
        .bind(&agent.name)
        .bind(&agent.description)
        .bind(&agent.model)
        .bind(&agent.system_prompt)
        .bind(tools)
        .bind(&agent.generated_code)
        .bind(agent.is_public)
        .bind(agent.exposable_as_mcp_tool)
        .bind(&agent.mcp_tool_name)
        .bind(&agent.mcp_input_schema)
        .bind(agent.created_by.as_str())
        .bind(agent.created_at)
        .bind(agent.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(format!("Failed to save agent: {}", e)))?;

        Ok(())
    }

    async fn find_by_id(&self, id: AgentId) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {} FROM agents WHERE id = $1", AGENT_COLUMNS))
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn find_by_owner(&self, owner: &UserId) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE created_by = $1 ORDER BY created_at DESC",
            AGENT_COLUMNS
        ))
        .bind(owner.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn find_public(&self, limit: usize) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE is_public = TRUE ORDER BY created_at DESC LIMIT $1",
            AGENT_COLUMNS
        ))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn find_exposable(&self) -> Result<Vec<Agent>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM agents WHERE exposable_as_mcp_tool = TRUE ORDER BY created_at DESC",
            AGENT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(agent_from_row).collect()
    }

    async fn find_by_mcp_tool_name(&self, tool_name: &str) -> Result<Option<Agent>, RepositoryError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {} FROM agents
            WHERE mcp_tool_name = $1 AND exposable_as_mcp_tool = TRUE
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            AGENT_COLUMNS
        ))
        .bind(tool_name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(agent_from_row).transpose()
    }

    async fn delete(&self, id: AgentId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
