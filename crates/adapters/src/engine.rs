// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The container engine seam.
//!
//! Everything the upgrader needs from an engine, as an object-safe trait:
//! lookup by name (not-found distinct from other errors), stop, remove,
//! image remove with force, pull (blocking or streamed status records),
//! and create+start detached. Implemented by [`crate::DockerEngine`] and,
//! for tests, [`crate::FakeEngine`].

use async_trait::async_trait;
use capstan_core::{ContainerSpec, PullEvent, RestartPolicy};
use futures_util::stream::BoxStream;
use thiserror::Error;

/// Errors from engine operations.
///
/// `NotFound` is a separate variant: for most lifecycle operations an
/// absent container or image is a successful no-op, not a failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("engine api error: {0}")]
    Api(String),
}

/// Result of a container lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerInfo {
    pub running: bool,
}

/// Engine-level parameters for creating and starting a container, already
/// translated from a [`ContainerSpec`]: paths normalized, binds formatted,
/// env flattened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub image: String,
    pub name: String,
    /// (host port, container port), in spec order
    pub ports: Vec<(String, String)>,
    /// `host:container:rw` bind strings, in spec order
    pub binds: Vec<String>,
    pub restart_policy: RestartPolicy,
    /// `NAME=value` pairs, in spec order
    pub env: Vec<String>,
}

impl RunRequest {
    /// Translate a spec into engine run parameters.
    ///
    /// Host paths are normalized to forward slashes for every volume entry;
    /// the engine API only accepts POSIX-style paths even when the host is
    /// Windows. All binds are read-write.
    pub fn from_spec(spec: &ContainerSpec) -> Self {
        let binds = spec
            .volumes
            .iter()
            .map(|(host, container)| format!("{}:{}:rw", normalize_host_path(host), container))
            .collect();
        let env = spec
            .env
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Self {
            image: spec.image.clone(),
            name: spec.name.clone(),
            ports: spec
                .ports
                .iter()
                .map(|(host, container)| (host.clone(), container.clone()))
                .collect(),
            binds,
            restart_policy: spec.restart_policy,
            env,
        }
    }
}

/// Convert backslash path separators to forward slashes.
pub fn normalize_host_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Handle to the container engine. Process-wide, created once, shared by
/// all operations; no client-side caching of container or image state.
#[async_trait]
pub trait ContainerApi: Send + Sync {
    /// Connectivity probe, used once at startup.
    async fn ping(&self) -> Result<(), EngineError>;

    /// Look up a container by name. Absence is `EngineError::NotFound`.
    async fn inspect(&self, name: &str) -> Result<ContainerInfo, EngineError>;

    async fn stop(&self, name: &str) -> Result<(), EngineError>;

    async fn remove_container(&self, name: &str) -> Result<(), EngineError>;

    /// Remove an image with force; a stopped container still referencing it
    /// must not make this fail.
    async fn remove_image(&self, image: &str) -> Result<(), EngineError>;

    /// Blocking pull of the image's latest published tag.
    async fn pull(&self, image: &str) -> Result<(), EngineError>;

    /// Streamed pull of the image's latest published tag, yielding status
    /// records as the engine reports them.
    fn pull_events<'a>(&'a self, image: &str) -> BoxStream<'a, Result<PullEvent, EngineError>>;

    /// Create and start a container, detached.
    async fn run(&self, req: &RunRequest) -> Result<(), EngineError>;
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
