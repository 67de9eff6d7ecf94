// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Deployment Aggregate
//!
//! A request to run an agent on managed infrastructure. Status only moves
//! forward:
//!
//! ```text
//! Created ──▶ Running ──▶ Completed
//!    │           │
//!    └───────────┴──────▶ Failed
//! ```
//!
//! Terminal states (`Completed`, `Failed`) accept no further transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::agent::AgentId;
use crate::domain::identity::UserId;
use crate::domain::ownership::Owned;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeploymentId(pub Uuid);

impl DeploymentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for DeploymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hosting tier the deployment was requested on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentTier {
    #[default]
    Freemium,
    Personal,
    Enterprise,
}

impl DeploymentTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freemium => "freemium",
            Self::Personal => "personal",
            Self::Enterprise => "enterprise",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "freemium" => Some(Self::Freemium),
            "personal" => Some(Self::Personal),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Created,
    Running,
    Completed,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Forward-only transition table. Re-asserting the current state is
    /// not a transition and is rejected.
    pub fn can_transition_to(&self, next: DeploymentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Created, Self::Running)
                | (Self::Created, Self::Failed)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
        )
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub id: DeploymentId,
    pub agent_id: AgentId,
    pub user_id: UserId,
    pub tier: DeploymentTier,
    pub region: String,
    pub status: DeploymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewDeployment {
    pub agent_id: AgentId,
    #[serde(default)]
    pub tier: DeploymentTier,
    pub region: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPatch {
    pub status: Option<DeploymentStatus>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeploymentError {
    #[error("Invalid deployment status transition: {from} -> {to}")]
    InvalidTransition {
        from: DeploymentStatus,
        to: DeploymentStatus,
    },
}

impl Deployment {
    pub fn new(request: NewDeployment, owner: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: DeploymentId::new(),
            agent_id: request.agent_id,
            user_id: owner,
            tier: request.tier,
            region: request.region,
            status: DeploymentStatus::Created,
            error: None,
            started_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `next`, stamping `started_at` / `completed_at` on entry.
    pub fn transition_to(
        &mut self,
        next: DeploymentStatus,
        now: DateTime<Utc>,
    ) -> Result<(), DeploymentError> {
        if !self.status.can_transition_to(next) {
            return Err(DeploymentError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        if next == DeploymentStatus::Running {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.completed_at = Some(now);
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Apply a partial update. Validation happens before any field is
    /// touched, so a rejected patch leaves the deployment unchanged.
    pub fn apply(&mut self, patch: DeploymentPatch, now: DateTime<Utc>) -> Result<(), DeploymentError> {
        if let Some(next) = patch.status {
            self.transition_to(next, now)?;
        }
        if let Some(error) = patch.error {
            self.error = Some(error);
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Owned for Deployment {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}
