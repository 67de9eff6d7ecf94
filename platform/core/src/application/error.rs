// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Handler error taxonomy.
//!
//! A closed set of variants so the calling layer can branch on kind
//! instead of message text. Nothing here is retried internally.

use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::deployment::DeploymentError;
use crate::domain::memory::MemoryError;
use crate::domain::repository::RepositoryError;
use crate::domain::storage::StorageError;

#[derive(Debug, Error)]
pub enum PlatformError {
    /// No caller could be resolved for an operation that requires one
    #[error("Not authenticated")]
    Unauthenticated,

    /// The record is missing or not owned by the caller. The two cases are
    /// merged so responses never reveal whether a record exists.
    #[error("{0} not found or access denied")]
    NotFoundOrForbidden(&'static str),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error(transparent)]
    InvalidTransition(#[from] DeploymentError),

    #[error(transparent)]
    InvalidMemory(#[from] MemoryError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type PlatformResult<T> = Result<T, PlatformError>;
