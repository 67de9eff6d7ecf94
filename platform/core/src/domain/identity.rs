// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Caller Identity
//!
//! The authenticated user behind an inbound call. Identity is resolved by
//! an external authentication provider through the [`AuthResolver`]
//! contract; this crate never issues tokens or manages sessions.
//!
//! Every ownership field on a record (`created_by`, `user_id`) is stamped
//! from the resolved [`CallerIdentity`], never from caller-supplied input.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque user identifier issued by the authentication provider
/// (the token subject).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
            email: None,
        }
    }
}

/// Per-request call context handed to every handler.
///
/// Carries only what the auth resolver needs; handlers never read
/// ownership from it directly.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub bearer_token: Option<String>,
}

impl RequestContext {
    /// Context with no credentials attached
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_bearer(token: impl Into<String>) -> Self {
        Self {
            bearer_token: Some(token.into()),
        }
    }

    /// Build a context from a raw `Authorization` header value.
    ///
    /// Anything other than a non-empty `Bearer <token>` yields an
    /// anonymous context.
    pub fn from_authorization_header(value: &str) -> Self {
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => Self::with_bearer(token),
            None => Self::anonymous(),
        }
    }
}

/// Resolves the authenticated caller for an inbound call.
///
/// Returns `None` when no caller can be established (missing, malformed or
/// rejected credentials). Handlers decide whether absence is an error.
#[async_trait]
pub trait AuthResolver: Send + Sync {
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<CallerIdentity>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_header_parsing() {
        let ctx = RequestContext::from_authorization_header("Bearer abc.def");
        assert_eq!(ctx.bearer_token.as_deref(), Some("abc.def"));

        let ctx = RequestContext::from_authorization_header("Basic dXNlcjpwYXNz");
        assert!(ctx.bearer_token.is_none());

        let ctx = RequestContext::from_authorization_header("Bearer   ");
        assert!(ctx.bearer_token.is_none());
    }

    #[test]
    fn test_user_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&UserId::new("user-1")).unwrap();
        assert_eq!(json, "\"user-1\"");
    }
}
