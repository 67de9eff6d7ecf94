// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent handler behaviour against in-memory backends: visibility of
//! private and public records, owner-only writes, public listing and MCP
//! tool exposure.

mod common;

use agent_platform_core::application::agent::PUBLIC_AGENT_LIMIT;
use agent_platform_core::application::PlatformError;
use agent_platform_core::domain::agent::{default_tool_input_schema, AgentId, AgentPatch, NewAgent};
use agent_platform_core::domain::identity::RequestContext;
use common::{alice, bob, draft, harness};

#[tokio::test]
async fn test_private_agent_hidden_until_made_public() {
    let h = harness();
    let agents = &h.platform.agents;

    let id = agents.create(&alice(), draft("Researcher")).await.unwrap();

    assert!(agents.get(&bob(), id).await.unwrap().is_none());
    assert!(agents.get(&RequestContext::anonymous(), id).await.unwrap().is_none());
    assert!(agents.get(&alice(), id).await.unwrap().is_some());

    agents
        .update(
            &alice(),
            id,
            AgentPatch {
                is_public: Some(true),
                ..AgentPatch::default()
            },
        )
        .await
        .unwrap();

    let seen_by_bob = agents.get(&bob(), id).await.unwrap().unwrap();
    assert_eq!(seen_by_bob.id, id);
    assert_eq!(seen_by_bob.created_by.as_str(), "alice");
    assert!(agents.get(&RequestContext::anonymous(), id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_owner_is_stamped_from_caller() {
    let h = harness();

    let id = h.platform.agents.create(&bob(), draft("Writer")).await.unwrap();
    let agent = h.platform.agents.get(&bob(), id).await.unwrap().unwrap();

    assert_eq!(agent.created_by.as_str(), "bob");
    assert_eq!(agent.created_at, agent.updated_at);
}

#[tokio::test]
async fn test_create_requires_authentication() {
    let h = harness();

    let err = h
        .platform
        .agents
        .create(&RequestContext::anonymous(), draft("Nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Unauthenticated));

    let err = h
        .platform
        .agents
        .create(&RequestContext::with_bearer("forged"), draft("Nobody"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlatformError::Unauthenticated));
}

#[tokio::test]
async fn test_non_owner_writes_look_like_missing_records() {
    let h = harness();
    let agents = &h.platform.agents;
    let id = agents.create(&alice(), draft("Planner")).await.unwrap();

    let patch = AgentPatch {
        name: Some("Hijacked".to_string()),
        ..AgentPatch::default()
    };
    let foreign = agents.update(&bob(), id, patch.clone()).await.unwrap_err();
    let missing = agents.update(&bob(), AgentId::new(), patch).await.unwrap_err();
    assert!(matches!(foreign, PlatformError::NotFoundOrForbidden("Agent")));
    assert_eq!(foreign.to_string(), missing.to_string());

    let err = agents.remove(&bob(), id).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFoundOrForbidden(_)));

    let agent = agents.get(&alice(), id).await.unwrap().unwrap();
    assert_eq!(agent.name, "Planner");
}

#[tokio::test]
async fn test_update_refreshes_timestamp_and_keeps_unset_fields() {
    let h = harness();
    let agents = &h.platform.agents;
    let id = agents
        .create(
            &alice(),
            NewAgent {
                description: Some("Summarises papers".to_string()),
                ..draft("Summariser")
            },
        )
        .await
        .unwrap();

    h.clock.advance_millis(1_500);
    agents
        .update(
            &alice(),
            id,
            AgentPatch {
                model: Some("claude-opus".to_string()),
                ..AgentPatch::default()
            },
        )
        .await
        .unwrap();

    let agent = agents.get(&alice(), id).await.unwrap().unwrap();
    assert_eq!(agent.model, "claude-opus");
    assert_eq!(agent.description.as_deref(), Some("Summarises papers"));
    assert_eq!((agent.updated_at - agent.created_at).num_milliseconds(), 1_500);
}

#[tokio::test]
async fn test_remove_twice_fails_the_second_time() {
    let h = harness();
    let agents = &h.platform.agents;
    let id = agents.create(&alice(), draft("Ephemeral")).await.unwrap();

    agents.remove(&alice(), id).await.unwrap();
    assert!(agents.get(&alice(), id).await.unwrap().is_none());

    let err = agents.remove(&alice(), id).await.unwrap_err();
    assert!(matches!(err, PlatformError::NotFoundOrForbidden(_)));
}

#[tokio::test]
async fn test_list_is_owner_scoped_and_recent_first() {
    let h = harness();
    let agents = &h.platform.agents;

    let first = agents.create(&alice(), draft("First")).await.unwrap();
    h.clock.advance_millis(10);
    let second = agents.create(&alice(), draft("Second")).await.unwrap();
    agents.create(&bob(), draft("Bob's")).await.unwrap();

    let listed: Vec<AgentId> = agents
        .list(&alice())
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.id)
        .collect();
    assert_eq!(listed, vec![second, first]);

    assert!(agents.list(&RequestContext::anonymous()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_public_is_capped() {
    let h = harness();
    let agents = &h.platform.agents;

    for i in 0..(PUBLIC_AGENT_LIMIT + 5) {
        h.clock.advance_millis(1);
        agents
            .create(
                &alice(),
                NewAgent {
                    is_public: true,
                    ..draft(&format!("Public {}", i))
                },
            )
            .await
            .unwrap();
    }
    agents.create(&bob(), draft("Private")).await.unwrap();

    let public = agents.list_public().await.unwrap();
    assert_eq!(public.len(), PUBLIC_AGENT_LIMIT);
    assert!(public.iter().all(|a| a.is_public));
    assert_eq!(public[0].name, format!("Public {}", PUBLIC_AGENT_LIMIT + 4));
}

#[tokio::test]
async fn test_exposable_agents_become_tool_descriptors() {
    let h = harness();
    let agents = &h.platform.agents;

    let explicit = agents
        .create(
            &alice(),
            NewAgent {
                exposable_as_mcp_tool: true,
                mcp_tool_name: Some("web_search".to_string()),
                description: Some("Searches the web".to_string()),
                mcp_input_schema: Some(serde_json::json!({"type": "object"})),
                ..draft("Search Agent")
            },
        )
        .await
        .unwrap();
    h.clock.advance_millis(1);
    let derived = agents
        .create(
            &bob(),
            NewAgent {
                exposable_as_mcp_tool: true,
                ..draft("Code Reviewer")
            },
        )
        .await
        .unwrap();
    agents.create(&alice(), draft("Not Exposed")).await.unwrap();

    let tools = agents.list_exposable().await.unwrap();
    assert_eq!(tools.len(), 2);

    let search = tools.iter().find(|t| t.agent_id == explicit).unwrap();
    assert_eq!(search.name, "web_search");
    assert_eq!(search.description, "Searches the web");
    assert_eq!(search.input_schema, serde_json::json!({"type": "object"}));

    let reviewer = tools.iter().find(|t| t.agent_id == derived).unwrap();
    assert_eq!(reviewer.name, "code_reviewer");
    assert_eq!(reviewer.description, "Invoke the Code Reviewer agent");
    assert_eq!(reviewer.input_schema, default_tool_input_schema());
}

#[tokio::test]
async fn test_tool_lookup_by_name() {
    let h = harness();
    let agents = &h.platform.agents;

    let id = agents
        .create(
            &alice(),
            NewAgent {
                exposable_as_mcp_tool: true,
                mcp_tool_name: Some("translate".to_string()),
                ..draft("Translator")
            },
        )
        .await
        .unwrap();
    let slugged = agents
        .create(
            &alice(),
            NewAgent {
                exposable_as_mcp_tool: true,
                ..draft("Data Cleaner")
            },
        )
        .await
        .unwrap();

    let found = agents.get_by_mcp_tool_name("translate").await.unwrap().unwrap();
    assert_eq!(found.id, id);
    let found = agents.get_by_mcp_tool_name("data_cleaner").await.unwrap().unwrap();
    assert_eq!(found.id, slugged);
    assert!(agents.get_by_mcp_tool_name("unknown").await.unwrap().is_none());

    agents
        .update(
            &alice(),
            id,
            AgentPatch {
                exposable_as_mcp_tool: Some(false),
                ..AgentPatch::default()
            },
        )
        .await
        .unwrap();
    assert!(agents.get_by_mcp_tool_name("translate").await.unwrap().is_none());
}
