// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::identity::UserId;
use crate::domain::ownership::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A tool attached to an agent (built-in tool name plus optional settings)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentTool {
    pub name: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

impl AgentTool {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            config: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Model identifier (e.g. a Bedrock model id or an Ollama tag)
    pub model: String,
    pub system_prompt: String,
    #[serde(default)]
    pub tools: Vec<AgentTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_code: Option<String>,
    pub is_public: bool,

    /// Surface this agent through the MCP tool interface
    #[serde(rename = "exposableAsMCPTool")]
    pub exposable_as_mcp_tool: bool,
    #[serde(rename = "mcpToolName", skip_serializing_if = "Option::is_none")]
    pub mcp_tool_name: Option<String>,
    #[serde(rename = "mcpInputSchema", skip_serializing_if = "Option::is_none")]
    pub mcp_input_schema: Option<Value>,

    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating an agent. The owner is always the
/// resolved caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewAgent {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub model: String,
    pub system_prompt: String,
    #[serde(default)]
    pub tools: Vec<AgentTool>,
    #[serde(default)]
    pub generated_code: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(rename = "exposableAsMCPTool", default)]
    pub exposable_as_mcp_tool: bool,
    #[serde(rename = "mcpToolName", default)]
    pub mcp_tool_name: Option<String>,
    #[serde(rename = "mcpInputSchema", default)]
    pub mcp_input_schema: Option<Value>,
}

/// Partial update; only `Some` fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AgentPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub tools: Option<Vec<AgentTool>>,
    pub generated_code: Option<String>,
    pub is_public: Option<bool>,
    #[serde(rename = "exposableAsMCPTool")]
    pub exposable_as_mcp_tool: Option<bool>,
    #[serde(rename = "mcpToolName")]
    pub mcp_tool_name: Option<String>,
    #[serde(rename = "mcpInputSchema")]
    pub mcp_input_schema: Option<Value>,
}

/// Projection of an exposable agent into the shape MCP clients list as a tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct McpToolDescriptor {
    pub agent_id: AgentId,
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl Agent {
    pub fn new(draft: NewAgent, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: AgentId::new(),
            name: draft.name,
            description: draft.description,
            model: draft.model,
            system_prompt: draft.system_prompt,
            tools: draft.tools,
            generated_code: draft.generated_code,
            is_public: draft.is_public,
            exposable_as_mcp_tool: draft.exposable_as_mcp_tool,
            mcp_tool_name: draft.mcp_tool_name,
            mcp_input_schema: draft.mcp_input_schema,
            created_by: owner,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, patch: AgentPatch, now: DateTime<Utc>) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(system_prompt) = patch.system_prompt {
            self.system_prompt = system_prompt;
        }
        if let Some(tools) = patch.tools {
            self.tools = tools;
        }
        if let Some(code) = patch.generated_code {
            self.generated_code = Some(code);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(exposable) = patch.exposable_as_mcp_tool {
            self.exposable_as_mcp_tool = exposable;
        }
        if let Some(tool_name) = patch.mcp_tool_name {
            self.mcp_tool_name = Some(tool_name);
        }
        if let Some(schema) = patch.mcp_input_schema {
            self.mcp_input_schema = Some(schema);
        }
        self.updated_at = now;
    }

    /// Tool descriptor for this agent, or `None` when it is not exposable.
    ///
    /// Missing optional fields fall back to a name slugged from the agent
    /// name, a generic description and a single-`prompt` input schema.
    pub fn tool_descriptor(&self) -> Option<McpToolDescriptor> {
        if !self.exposable_as_mcp_tool {
            return None;
        }

        let name = self
            .mcp_tool_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| tool_name_slug(&self.name));

        let description = self
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Invoke the {} agent", self.name));

        let input_schema = self
            .mcp_input_schema
            .clone()
            .unwrap_or_else(default_tool_input_schema);

        Some(McpToolDescriptor {
            agent_id: self.id,
            name,
            description,
            input_schema,
        })
    }
}

impl Owned for Agent {
    fn owner(&self) -> &UserId {
        &self.created_by
    }

    fn is_public(&self) -> bool {
        self.is_public
    }
}

/// Input schema used when an exposable agent does not declare one
pub fn default_tool_input_schema() -> Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "prompt": { "type": "string" }
        },
        "required": ["prompt"]
    })
}

/// Lowercase, `_`-separated tool name derived from a display name.
pub fn tool_name_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    if slug.is_empty() {
        "agent".to_string()
    } else {
        slug.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_agent() -> Agent {
        Agent::new(
            NewAgent {
                name: "Weather Bot".to_string(),
                model: "anthropic.claude-3-haiku".to_string(),
                system_prompt: "You report the weather.".to_string(),
                ..Default::default()
            },
            UserId::new("user-a"),
            Utc::now(),
        )
    }

    #[test]
    fn test_patch_only_touches_supplied_fields() {
        let mut agent = sample_agent();
        let before = agent.clone();

        agent.apply(
            AgentPatch {
                is_public: Some(true),
                ..Default::default()
            },
            Utc::now(),
        );

        assert!(agent.is_public);
        assert_eq!(agent.name, before.name);
        assert_eq!(agent.system_prompt, before.system_prompt);
        assert_eq!(agent.created_by, before.created_by);
    }

    #[test]
    fn test_descriptor_defaults() {
        let mut agent = sample_agent();
        assert!(agent.tool_descriptor().is_none());

        agent.exposable_as_mcp_tool = true;
        let descriptor = agent.tool_descriptor().unwrap();
        assert_eq!(descriptor.name, "weather_bot");
        assert_eq!(descriptor.description, "Invoke the Weather Bot agent");
        assert_eq!(
            descriptor.input_schema,
            serde_json::json!({
                "type": "object",
                "properties": {"prompt": {"type": "string"}},
                "required": ["prompt"]
            })
        );
    }

    #[test]
    fn test_descriptor_prefers_declared_fields() {
        let mut agent = sample_agent();
        agent.exposable_as_mcp_tool = true;
        agent.mcp_tool_name = Some("forecast".to_string());
        agent.description = Some("Seven day forecasts".to_string());
        agent.mcp_input_schema = Some(serde_json::json!({"type": "object"}));

        let descriptor = agent.tool_descriptor().unwrap();
        assert_eq!(descriptor.name, "forecast");
        assert_eq!(descriptor.description, "Seven day forecasts");
        assert_eq!(descriptor.input_schema, serde_json::json!({"type": "object"}));
    }

    #[test]
    fn test_visibility() {
        let mut agent = sample_agent();
        let owner = UserId::new("user-a");
        let other = UserId::new("user-b");

        assert!(agent.is_visible_to(Some(&owner)));
        assert!(!agent.is_visible_to(Some(&other)));
        assert!(!agent.is_visible_to(None));

        agent.is_public = true;
        assert!(agent.is_visible_to(Some(&other)));
        assert!(agent.is_visible_to(None));
    }

    #[test]
    fn test_tool_name_slug() {
        assert_eq!(tool_name_slug("  Code -- Reviewer!"), "code_reviewer");
        assert_eq!(tool_name_slug("***"), "agent");
    }
}
