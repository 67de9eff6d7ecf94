// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Tool Memory
//!
//! Generic key-value memory used by agent tools, keyed by
//! `(user_id, memory_type, key)`.
//!
//! Expiration is lazy. An entry with a TTL stays physically stored after it
//! lapses until it is overwritten, removed or swept; every read path must
//! check [`MemoryEntry::is_expired_at`] and treat an expired entry as absent.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::identity::UserId;
use crate::domain::ownership::Owned;

/// Longest accepted TTL: 100 years. `updated_at + ttl` stays inside the
/// range of a PostgreSQL `timestamptz` and `interval`.
pub const MAX_TTL_SECONDS: u64 = 100 * 365 * 24 * 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("TTL of {ttl}s exceeds the maximum of {max}s")]
    TtlTooLong { ttl: u64, max: u64 },
}

/// Accept `ttl` if it is within [`MAX_TTL_SECONDS`].
pub fn check_ttl(ttl: u64) -> Result<u64, MemoryError> {
    if ttl > MAX_TTL_SECONDS {
        return Err(MemoryError::TtlTooLong {
            ttl,
            max: MAX_TTL_SECONDS,
        });
    }
    Ok(ttl)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryEntryId(pub Uuid);

impl MemoryEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MemoryEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MemoryEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key identifying exactly one memory entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryKey {
    pub user_id: UserId,
    pub memory_type: String,
    pub key: String,
}

impl MemoryKey {
    pub fn new(user_id: UserId, memory_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            user_id,
            memory_type: memory_type.into(),
            key: key.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub id: MemoryEntryId,
    pub user_id: UserId,
    pub memory_type: String,
    pub key: String,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Lifetime in seconds, measured from `updated_at`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemoryEntry {
    pub fn new(
        key: MemoryKey,
        value: String,
        metadata: Option<Value>,
        ttl: Option<u64>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MemoryEntryId::new(),
            user_id: key.user_id,
            memory_type: key.memory_type,
            key: key.key,
            value,
            metadata,
            ttl,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn memory_key(&self) -> MemoryKey {
        MemoryKey::new(self.user_id.clone(), self.memory_type.clone(), self.key.clone())
    }

    /// Overwrite the value and refresh the TTL window. `None` metadata or
    /// TTL keeps the stored one.
    pub fn overwrite(
        &mut self,
        value: String,
        metadata: Option<Value>,
        ttl: Option<u64>,
        now: DateTime<Utc>,
    ) {
        self.value = value;
        if metadata.is_some() {
            self.metadata = metadata;
        }
        if ttl.is_some() {
            self.ttl = ttl;
        }
        self.updated_at = now;
    }

    /// `true` once `now - updated_at` exceeds `ttl` seconds. The comparison
    /// is exact, the same as the SQL sweep.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let window = self
            .ttl
            .and_then(|ttl| i64::try_from(ttl).ok())
            .and_then(Duration::try_seconds);
        match window {
            Some(window) => now - self.updated_at > window,
            None => false,
        }
    }
}

impl Owned for MemoryEntry {
    fn owner(&self) -> &UserId {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry_at(now: DateTime<Utc>, ttl: Option<u64>) -> MemoryEntry {
        MemoryEntry::new(
            MemoryKey::new(UserId::new("u1"), "short", "k"),
            "v1".to_string(),
            None,
            ttl,
            now,
        )
    }

    #[test]
    fn test_expiry_boundary() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let entry = entry_at(t0, Some(10));

        assert!(!entry.is_expired_at(t0 + Duration::milliseconds(9_999)));
        assert!(!entry.is_expired_at(t0 + Duration::milliseconds(10_000)));
        assert!(entry.is_expired_at(t0 + Duration::milliseconds(10_001)));
    }

    #[test]
    fn test_expiry_is_exact_below_a_millisecond() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let entry = entry_at(t0, Some(10));

        assert!(!entry.is_expired_at(t0 + Duration::seconds(10)));
        assert!(entry.is_expired_at(t0 + Duration::seconds(10) + Duration::microseconds(1)));
    }

    #[test]
    fn test_ttl_is_bounded() {
        assert_eq!(check_ttl(60), Ok(60));
        assert_eq!(check_ttl(MAX_TTL_SECONDS), Ok(MAX_TTL_SECONDS));
        assert_eq!(
            check_ttl(u64::MAX),
            Err(MemoryError::TtlTooLong {
                ttl: u64::MAX,
                max: MAX_TTL_SECONDS
            })
        );

        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let entry = entry_at(t0, Some(MAX_TTL_SECONDS));
        assert!(!entry.is_expired_at(t0 + Duration::days(365 * 99)));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let entry = entry_at(t0, None);
        assert!(!entry.is_expired_at(t0 + Duration::days(3650)));
    }

    #[test]
    fn test_overwrite_refreshes_window_and_keeps_metadata() {
        let t0 = DateTime::<Utc>::UNIX_EPOCH;
        let mut entry = entry_at(t0, Some(10));
        entry.metadata = Some(serde_json::json!({"source": "tool"}));

        let t1 = t0 + Duration::seconds(8);
        entry.overwrite("v2".to_string(), None, None, t1);

        assert_eq!(entry.value, "v2");
        assert_eq!(entry.updated_at, t1);
        assert_eq!(entry.created_at, t0);
        assert_eq!(entry.metadata, Some(serde_json::json!({"source": "tool"})));
        assert!(!entry.is_expired_at(t0 + Duration::seconds(15)));
    }
}
