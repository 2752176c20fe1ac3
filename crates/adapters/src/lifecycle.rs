// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-container lifecycle operations.
//!
//! Each operation returns a definite boolean outcome: absent targets are
//! successful no-ops, engine API errors are caught, logged with the
//! operation and target, and reported as `false`. No error and no panic
//! crosses this boundary. Logging is a side channel and never affects the
//! return value.

use crate::engine::{ContainerApi, EngineError, RunRequest};
use capstan_core::{ContainerSpec, PullProgress};
use futures_util::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Container lifecycle manager over a shared engine handle.
#[derive(Clone)]
pub struct Lifecycle {
    api: Arc<dyn ContainerApi>,
}

impl Lifecycle {
    pub fn new(api: Arc<dyn ContainerApi>) -> Self {
        Self { api }
    }

    /// Stop a container if it exists and is running.
    ///
    /// Idempotent: a missing or already-stopped container is a success.
    pub async fn stop(&self, name: &str) -> bool {
        match self.api.inspect(name).await {
            Ok(info) if info.running => {
                info!(container = name, "stopping container");
                match self.api.stop(name).await {
                    Ok(()) => {
                        info!(container = name, "container stopped");
                        true
                    }
                    Err(err) => {
                        error!(container = name, error = %err, "error stopping container");
                        false
                    }
                }
            }
            Ok(_) => {
                info!(container = name, "container is not running");
                true
            }
            Err(EngineError::NotFound(_)) => {
                info!(container = name, "container not found");
                true
            }
            Err(err) => {
                error!(container = name, error = %err, "error stopping container");
                false
            }
        }
    }

    /// Remove a container if it exists. Missing containers are a success.
    pub async fn remove_container(&self, name: &str) -> bool {
        info!(container = name, "removing container");
        match self.api.remove_container(name).await {
            Ok(()) => {
                info!(container = name, "container removed");
                true
            }
            Err(EngineError::NotFound(_)) => {
                info!(container = name, "container not found");
                true
            }
            Err(err) => {
                error!(container = name, error = %err, "error removing container");
                false
            }
        }
    }

    /// Remove an image if it exists, with force so a stopped-but-unpruned
    /// container referencing it cannot fail the removal. Missing images are
    /// a success.
    pub async fn remove_image(&self, image: &str) -> bool {
        info!(image, "removing image");
        match self.api.remove_image(image).await {
            Ok(()) => {
                info!(image, "image removed");
                true
            }
            Err(EngineError::NotFound(_)) => {
                info!(image, "image not found");
                true
            }
            Err(err) => {
                error!(image, error = %err, "error removing image");
                false
            }
        }
    }

    /// Pull the latest published image, reporting layer progress.
    ///
    /// The streamed pull is the primary path; any streaming error falls
    /// back transparently to a blocking pull. Progress is presentational
    /// only and never decides success or failure.
    pub async fn pull(&self, image: &str) -> bool {
        info!(image, "pulling latest image");
        match self.pull_with_progress(image).await {
            Ok(()) => true,
            Err(err) => {
                warn!(image, error = %err, "streamed pull failed, retrying as blocking pull");
                match self.api.pull(image).await {
                    Ok(()) => true,
                    Err(err) => {
                        error!(image, error = %err, "error pulling image");
                        false
                    }
                }
            }
        }
    }

    async fn pull_with_progress(&self, image: &str) -> Result<(), EngineError> {
        let mut progress = PullProgress::new();
        let mut events = self.api.pull_events(image);
        while let Some(event) = events.next().await {
            let event = event?;
            if progress.observe(&event) {
                info!(
                    image,
                    completed = progress.completed(),
                    total = progress.total(),
                    "pull progress"
                );
            }
            if event.is_terminal() {
                info!(image, status = %event.status, "pull finished");
                break;
            }
        }
        Ok(())
    }

    /// Pull the spec's image and create + start the container detached.
    pub async fn deploy(&self, name: &str, spec: &ContainerSpec) -> bool {
        if !self.pull(&spec.image).await {
            return false;
        }

        let req = RunRequest::from_spec(spec);
        for bind in &req.binds {
            info!(container = name, bind, "using volume");
        }

        info!(container = name, image = %spec.image, "creating and starting container");
        match self.api.run(&req).await {
            Ok(()) => {
                info!(container = name, "container deployed");
                true
            }
            Err(err) => {
                error!(container = name, error = %err, "error deploying container");
                false
            }
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
