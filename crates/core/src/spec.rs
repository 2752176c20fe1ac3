// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Container specifications and upgrade tasks.
//!
//! A [`ContainerSpec`] is the immutable description of one deployable
//! container, built once at startup from configuration. An [`UpgradeTask`]
//! pairs a container name with its spec; the batch is an ordered list of
//! tasks and order is significant.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Restart policy applied to a redeployed container.
///
/// Serialized with the engine's own names (`no`, `on-failure`,
/// `unless-stopped`, `always`); `none` is accepted as an alias for `no`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    #[serde(alias = "none")]
    No,
    OnFailure,
    #[default]
    UnlessStopped,
    Always,
}

crate::simple_display! {
    RestartPolicy {
        No => "no",
        OnFailure => "on-failure",
        UnlessStopped => "unless-stopped",
        Always => "always",
    }
}

/// Immutable description of a deployable container.
///
/// Port and volume mappings are ordered; absent mappings are valid and
/// yield no port bindings / no binds. Volume host paths are fully resolved
/// (no `${VAR}` references) by the time a spec exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    /// Image reference, always pulled at its latest published tag
    pub image: String,
    /// Container name (unique key within the batch)
    pub name: String,
    /// Host port -> container port
    #[serde(default)]
    pub ports: IndexMap<String, String>,
    /// Host path -> container path, mounted read-write
    #[serde(default)]
    pub volumes: IndexMap<String, String>,
    #[serde(default)]
    pub restart_policy: RestartPolicy,
    /// Environment variable name -> value
    #[serde(default)]
    pub env: IndexMap<String, String>,
    /// Names of containers this one depends on (informational ordering)
    #[serde(default)]
    pub depends_on: Vec<String>,
}

crate::builder! {
    pub struct ContainerSpecBuilder => ContainerSpec {
        into {
            image: String = "registry.test/app",
            name: String = "app",
        }
        set {
            ports: IndexMap<String, String> = IndexMap::new(),
            volumes: IndexMap<String, String> = IndexMap::new(),
            restart_policy: RestartPolicy = RestartPolicy::UnlessStopped,
            env: IndexMap<String, String> = IndexMap::new(),
            depends_on: Vec<String> = Vec::new(),
        }
    }
}

/// One entry of the upgrade batch: a container name, its spec, and whether
/// the driver should pause after upgrading it so dependents can initialize
/// against the fresh container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTask {
    pub name: String,
    pub spec: ContainerSpec,
    /// Pause for the settle delay after this task succeeds
    #[serde(default)]
    pub settle: bool,
}

impl UpgradeTask {
    pub fn new(spec: ContainerSpec, settle: bool) -> Self {
        Self {
            name: spec.name.clone(),
            spec,
            settle,
        }
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
