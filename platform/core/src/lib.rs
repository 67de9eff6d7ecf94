// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Agent Platform Core
//!
//! Data-access handlers for the agent builder platform: agents,
//! deployments, deployment packages, the per-user tool memory store, and
//! the artifact storage wrapper used to ship deployment packages.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Authorization-checked record handlers over pluggable
//!   repositories and object storage

pub mod config;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod telemetry;

pub use domain::*;
