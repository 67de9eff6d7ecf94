// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Caller Resolution
//!
//! `AuthResolver` implementations. Resolution never fails loudly: a missing,
//! malformed, expired or unknown bearer token resolves to `None` and the
//! services treat the request as anonymous.

use std::collections::HashMap;

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AuthConfig;
use crate::domain::identity::{AuthResolver, CallerIdentity, RequestContext};

/// Fixed token -> identity map for development and tests
#[derive(Default)]
pub struct StaticAuthResolver {
    tokens: RwLock<HashMap<String, CallerIdentity>>,
}

impl StaticAuthResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.insert(token, CallerIdentity::new(user_id));
        self
    }

    pub fn insert(&self, token: impl Into<String>, identity: CallerIdentity) {
        self.tokens.write().insert(token.into(), identity);
    }
}

#[async_trait]
impl AuthResolver for StaticAuthResolver {
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<CallerIdentity> {
        let token = ctx.bearer_token.as_deref()?;
        self.tokens.read().get(token).cloned()
    }
}

/// Claims read from platform bearer tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BearerClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// HS256 bearer verifier; the `sub` claim becomes the caller id.
pub struct JwtAuthResolver {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthResolver {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(iss) = issuer {
            validation.set_issuer(&[iss]);
        }

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// `None` when no secret is configured
    pub fn from_config(config: &AuthConfig) -> Option<Self> {
        config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|secret| Self::new(secret, config.issuer.as_deref()))
    }
}

#[async_trait]
impl AuthResolver for JwtAuthResolver {
    async fn resolve_caller(&self, ctx: &RequestContext) -> Option<CallerIdentity> {
        let token = ctx.bearer_token.as_deref()?;

        match decode::<BearerClaims>(token, &self.decoding_key, &self.validation) {
            Ok(data) if !data.claims.sub.is_empty() => {
                debug!("Resolved caller {}", data.claims.sub);
                let mut identity = CallerIdentity::new(data.claims.sub);
                identity.email = data.claims.email;
                Some(identity)
            }
            Ok(_) => {
                warn!("Bearer token has an empty subject");
                None
            }
            Err(e) => {
                warn!("Rejected bearer token: {}", e);
                None
            }
        }
    }
}
