// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker engine adapter.
//!
//! Implements [`ContainerApi`] against a local Docker daemon via bollard,
//! connecting over the platform default transport (Unix socket or named
//! pipe). Pulls always request the `latest` tag; the upgrader never
//! compares image versions.

use crate::engine::{ContainerApi, ContainerInfo, EngineError, RunRequest};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::image::{CreateImageOptions, RemoveImageOptions};
use bollard::models::{HostConfig, PortBinding, RestartPolicy, RestartPolicyNameEnum};
use bollard::Docker;
use capstan_core::PullEvent;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use std::collections::HashMap;

/// [`ContainerApi`] implementation backed by a Docker daemon.
#[derive(Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using the platform's default daemon address.
    pub fn connect() -> Result<Self, EngineError> {
        let docker = Docker::connect_with_local_defaults().map_err(EngineError::from)?;
        Ok(Self { docker })
    }

    fn create_image_stream<'a>(
        &'a self,
        image: &str,
    ) -> BoxStream<'a, Result<bollard::models::CreateImageInfo, EngineError>> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            tag: "latest".to_string(),
            ..Default::default()
        };
        self.docker
            .create_image(Some(options), None, None)
            .map(|result| result.map_err(EngineError::from))
            .boxed()
    }
}

impl From<bollard::errors::Error> for EngineError {
    fn from(err: bollard::errors::Error) -> Self {
        match err {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 404,
                message,
            } => EngineError::NotFound(message),
            other => EngineError::Api(other.to_string()),
        }
    }
}

fn restart_policy(policy: capstan_core::RestartPolicy) -> RestartPolicy {
    let name = match policy {
        capstan_core::RestartPolicy::No => RestartPolicyNameEnum::NO,
        capstan_core::RestartPolicy::OnFailure => RestartPolicyNameEnum::ON_FAILURE,
        capstan_core::RestartPolicy::UnlessStopped => RestartPolicyNameEnum::UNLESS_STOPPED,
        capstan_core::RestartPolicy::Always => RestartPolicyNameEnum::ALWAYS,
    };
    RestartPolicy {
        name: Some(name),
        maximum_retry_count: None,
    }
}

/// Container ports need a protocol suffix on the engine side; bare numbers
/// mean tcp.
fn container_port_key(port: &str) -> String {
    if port.contains('/') {
        port.to_string()
    } else {
        format!("{port}/tcp")
    }
}

#[async_trait]
impl ContainerApi for DockerEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        self.docker.ping().await.map(|_| ()).map_err(EngineError::from)
    }

    async fn inspect(&self, name: &str) -> Result<ContainerInfo, EngineError> {
        let response = self
            .docker
            .inspect_container(name, None::<InspectContainerOptions>)
            .await?;
        let running = response
            .state
            .and_then(|state| state.running)
            .unwrap_or(false);
        Ok(ContainerInfo { running })
    }

    async fn stop(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .stop_container(name, None::<StopContainerOptions>)
            .await
            .map_err(EngineError::from)
    }

    async fn remove_container(&self, name: &str) -> Result<(), EngineError> {
        self.docker
            .remove_container(name, None::<RemoveContainerOptions>)
            .await
            .map_err(EngineError::from)
    }

    async fn remove_image(&self, image: &str) -> Result<(), EngineError> {
        self.docker
            .remove_image(
                image,
                Some(RemoveImageOptions {
                    force: true,
                    ..Default::default()
                }),
                None,
            )
            .await
            .map(|_| ())
            .map_err(EngineError::from)
    }

    async fn pull(&self, image: &str) -> Result<(), EngineError> {
        let mut events = self.create_image_stream(image);
        while let Some(event) = events.next().await {
            event?;
        }
        Ok(())
    }

    fn pull_events<'a>(&'a self, image: &str) -> BoxStream<'a, Result<PullEvent, EngineError>> {
        self.create_image_stream(image)
            .map(|result| {
                result.map(|info| PullEvent {
                    status: info.status.unwrap_or_default(),
                    id: info.id,
                })
            })
            .boxed()
    }

    async fn run(&self, req: &RunRequest) -> Result<(), EngineError> {
        let mut port_bindings = HashMap::new();
        let mut exposed_ports = HashMap::new();
        for (host, container) in &req.ports {
            let key = container_port_key(container);
            exposed_ports.insert(key.clone(), HashMap::new());
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: None,
                    host_port: Some(host.clone()),
                }]),
            );
        }

        let host_config = HostConfig {
            binds: (!req.binds.is_empty()).then(|| req.binds.clone()),
            port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
            restart_policy: Some(restart_policy(req.restart_policy)),
            ..Default::default()
        };

        let config = Config {
            image: Some(req.image.clone()),
            env: (!req.env.is_empty()).then(|| req.env.clone()),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            host_config: Some(host_config),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: req.name.clone(),
                    platform: None,
                }),
                config,
            )
            .await?;
        self.docker
            .start_container(&req.name, None::<StartContainerOptions<String>>)
            .await
            .map_err(EngineError::from)
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
