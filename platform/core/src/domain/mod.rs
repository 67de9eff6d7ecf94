// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Domain
//!
//! Aggregates, value objects and the persistence / storage contracts the
//! application services are written against.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Pure types and traits, no infrastructure dependencies

pub mod agent;
pub mod clock;
pub mod deployment;
pub mod identity;
pub mod memory;
pub mod ownership;
pub mod package;
pub mod repository;
pub mod storage;
