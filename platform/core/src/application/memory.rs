// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Tool Memory Application Service
//!
//! Key-value memory for agent tools, keyed by `(owner, memory_type, key)`.
//!
//! # Expiration
//!
//! TTL is evaluated lazily: the repository returns whatever is stored and
//! every read path here drops entries whose window has lapsed. `search`
//! fetches by recency first and filters afterwards, so it can return fewer
//! than `max_items` even when more live entries exist further back.
//! `purge_expired` is the sweep for deployments that need storage bounded.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use crate::application::error::PlatformResult;
use crate::domain::clock::Clock;
use crate::domain::identity::UserId;
use crate::domain::memory::{check_ttl, MemoryEntry, MemoryEntryId, MemoryKey};
use crate::domain::repository::MemoryRepository;

/// Default `max_items` for `search`
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Value and options for a `store` call
#[derive(Debug, Clone, Default)]
pub struct StoreRequest {
    pub value: String,
    pub metadata: Option<Value>,
    /// Lifetime in seconds, at most `MAX_TTL_SECONDS`
    pub ttl: Option<u64>,
}

impl StoreRequest {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, seconds: u64) -> Self {
        self.ttl = Some(seconds);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[async_trait]
pub trait MemoryService: Send + Sync {
    /// Upsert by composite key, refreshing `updated_at` (and so the TTL
    /// window). Returns the entry id. Fails with `InvalidMemory` when the
    /// TTL exceeds `MAX_TTL_SECONDS`.
    async fn store(
        &self,
        owner: &UserId,
        memory_type: &str,
        key: &str,
        request: StoreRequest,
    ) -> PlatformResult<MemoryEntryId>;

    /// The entry, or `None` if missing or expired
    async fn retrieve(&self, owner: &UserId, memory_type: &str, key: &str) -> PlatformResult<Option<MemoryEntry>>;

    /// Up to `max_items` (default 20) live entries, most recently updated first
    async fn search(
        &self,
        owner: &UserId,
        memory_type: &str,
        max_items: Option<usize>,
    ) -> PlatformResult<Vec<MemoryEntry>>;

    /// `true` only when an entry was found and deleted
    async fn remove(&self, owner: &UserId, memory_type: &str, key: &str) -> PlatformResult<bool>;

    /// Delete every entry of one category; returns the number removed
    async fn clear_type(&self, owner: &UserId, memory_type: &str) -> PlatformResult<usize>;

    /// Physically remove every expired entry; returns the number removed
    async fn purge_expired(&self) -> PlatformResult<usize>;
}

pub struct StandardMemoryService {
    repository: Arc<dyn MemoryRepository>,
    clock: Arc<dyn Clock>,
}

impl StandardMemoryService {
    pub fn new(repository: Arc<dyn MemoryRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl MemoryService for StandardMemoryService {
    async fn store(
        &self,
        owner: &UserId,
        memory_type: &str,
        key: &str,
        request: StoreRequest,
    ) -> PlatformResult<MemoryEntryId> {
        let ttl = request.ttl.map(check_ttl).transpose()?;
        let memory_key = MemoryKey::new(owner.clone(), memory_type, key);
        let candidate = MemoryEntry::new(memory_key, request.value, request.metadata, ttl, self.clock.now());

        let entry = self.repository.upsert(&candidate).await?;
        debug!("Stored memory {}/{} for {} (id: {})", memory_type, key, owner, entry.id);
        Ok(entry.id)
    }

    async fn retrieve(&self, owner: &UserId, memory_type: &str, key: &str) -> PlatformResult<Option<MemoryEntry>> {
        let memory_key = MemoryKey::new(owner.clone(), memory_type, key);
        let now = self.clock.now();

        let entry = self.repository.find_by_key(&memory_key).await?;
        Ok(entry.filter(|e| !e.is_expired_at(now)))
    }

    async fn search(
        &self,
        owner: &UserId,
        memory_type: &str,
        max_items: Option<usize>,
    ) -> PlatformResult<Vec<MemoryEntry>> {
        let limit = max_items.unwrap_or(DEFAULT_SEARCH_LIMIT);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let now = self.clock.now();
        let entries = self
            .repository
            .find_recent_by_type(owner, memory_type, limit)
            .await?;

        Ok(entries
            .into_iter()
            .filter(|e| !e.is_expired_at(now))
            .take(limit)
            .collect())
    }

    async fn remove(&self, owner: &UserId, memory_type: &str, key: &str) -> PlatformResult<bool> {
        let memory_key = MemoryKey::new(owner.clone(), memory_type, key);

        match self.repository.find_by_key(&memory_key).await? {
            Some(entry) => Ok(self.repository.delete(entry.id).await?),
            None => Ok(false),
        }
    }

    async fn clear_type(&self, owner: &UserId, memory_type: &str) -> PlatformResult<usize> {
        let removed = self.repository.delete_by_type(owner, memory_type).await?;
        info!("Cleared {} memory entries of type '{}' for {}", removed, memory_type, owner);
        Ok(removed)
    }

    async fn purge_expired(&self) -> PlatformResult<usize> {
        let removed = self.repository.delete_expired(self.clock.now()).await?;
        if removed > 0 {
            info!("Purged {} expired memory entries", removed);
        }
        Ok(removed)
    }
}
