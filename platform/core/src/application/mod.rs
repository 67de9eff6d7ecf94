// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Application layer: the handler services and their wiring.

pub(crate) mod access;
pub mod agent;
pub mod artifact_storage;
pub mod deployment;
pub mod error;
pub mod memory;
pub mod package;
pub mod platform;
pub mod repository_factory;

pub use agent::{AgentService, StandardAgentService};
pub use artifact_storage::{ArtifactStorage, BuildContext, BuildContextPolicy};
pub use deployment::{DeploymentService, StandardDeploymentService};
pub use error::{PlatformError, PlatformResult};
pub use memory::{MemoryService, StandardMemoryService, StoreRequest};
pub use package::{PackageService, StandardPackageService};
pub use platform::{Platform, Repositories};
