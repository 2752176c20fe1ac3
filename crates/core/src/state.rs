// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task upgrade state machine.
//!
//! A task moves through the fixed sequence below, or to `Failed` from any
//! state on the first unsuccessful step. There are no retries; failure is
//! terminal for the task and for the batch.
//!
//! ```text
//! Pending -> Stopping -> Stopped -> RemovingContainer -> ContainerRemoved
//!         -> RemovingImage -> ImageRemoved -> Deploying -> Deployed
//! ```

use serde::{Deserialize, Serialize};

/// State of one upgrade transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeState {
    Pending,
    Stopping,
    Stopped,
    RemovingContainer,
    ContainerRemoved,
    RemovingImage,
    ImageRemoved,
    Deploying,
    Deployed,
    Failed,
}

impl UpgradeState {
    /// Terminal states end the transaction.
    pub fn is_terminal(&self) -> bool {
        matches!(self, UpgradeState::Deployed | UpgradeState::Failed)
    }

    /// The state entered after the current step succeeds, if any.
    pub fn on_success(&self) -> Option<UpgradeState> {
        use UpgradeState::*;
        match self {
            Pending => Some(Stopping),
            Stopping => Some(Stopped),
            Stopped => Some(RemovingContainer),
            RemovingContainer => Some(ContainerRemoved),
            ContainerRemoved => Some(RemovingImage),
            RemovingImage => Some(ImageRemoved),
            ImageRemoved => Some(Deploying),
            Deploying => Some(Deployed),
            Deployed | Failed => None,
        }
    }
}

crate::simple_display! {
    UpgradeState {
        Pending => "pending",
        Stopping => "stopping",
        Stopped => "stopped",
        RemovingContainer => "removing_container",
        ContainerRemoved => "container_removed",
        RemovingImage => "removing_image",
        ImageRemoved => "image_removed",
        Deploying => "deploying",
        Deployed => "deployed",
        Failed => "failed",
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
