// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

#![allow(dead_code)]

use std::sync::Arc;

use agent_platform_core::application::Platform;
use agent_platform_core::config::StorageConfig;
use agent_platform_core::domain::agent::NewAgent;
use agent_platform_core::domain::clock::ManualClock;
use agent_platform_core::domain::identity::RequestContext;
use agent_platform_core::infrastructure::auth::StaticAuthResolver;
use agent_platform_core::infrastructure::storage::InMemoryObjectStore;

pub const BUCKET: &str = "agent-deployments";

pub struct Harness {
    pub platform: Platform,
    pub store: InMemoryObjectStore,
    pub clock: Arc<ManualClock>,
}

pub fn alice() -> RequestContext {
    RequestContext::with_bearer("token-alice")
}

pub fn bob() -> RequestContext {
    RequestContext::with_bearer("token-bob")
}

pub fn storage_config() -> StorageConfig {
    StorageConfig {
        region: Some("us-west-2".to_string()),
        deployment_bucket: Some(BUCKET.to_string()),
        ..StorageConfig::default()
    }
}

pub fn harness() -> Harness {
    harness_with_storage(storage_config())
}

pub fn harness_with_storage(storage: StorageConfig) -> Harness {
    let store = InMemoryObjectStore::new();
    let clock = Arc::new(ManualClock::at_epoch());
    let auth = StaticAuthResolver::new()
        .with_user("token-alice", "alice")
        .with_user("token-bob", "bob");

    let platform = Platform::in_memory(
        Arc::new(store.clone()),
        storage,
        Arc::new(auth),
        clock.clone(),
    )
    .expect("valid storage config");

    Harness {
        platform,
        store,
        clock,
    }
}

pub fn draft(name: &str) -> NewAgent {
    NewAgent {
        name: name.to_string(),
        model: "claude-sonnet".to_string(),
        system_prompt: format!("You are {}.", name),
        ..NewAgent::default()
    }
}
