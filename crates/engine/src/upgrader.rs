// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The upgrade orchestrator.
//!
//! [`Upgrader::upgrade_one`] runs the fixed four-step transaction for one
//! container: stop, remove container, remove image, deploy. The first step
//! that fails ends the transaction. There is no compensating rollback: a
//! deploy failure after the removals leaves the container absent. Known
//! gap; a hardened variant would model the transaction as a saga with
//! per-step rollback actions.
//!
//! [`Upgrader::upgrade_all`] drives the ordered batch, aborting on the
//! first failed task (fail-fast, not best-effort) and pausing for the
//! settle delay after any task flagged as one dependents wait on.

use capstan_adapters::Lifecycle;
use capstan_core::{Clock, SystemClock, UpgradeState, UpgradeTask};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info};

/// Sequential upgrade driver. Strictly single-flight: one task fully
/// completes or fails before the next begins.
pub struct Upgrader<C: Clock = SystemClock> {
    lifecycle: Lifecycle,
    clock: C,
    settle_delay: Duration,
}

impl Upgrader<SystemClock> {
    pub fn new(lifecycle: Lifecycle, settle_delay: Duration) -> Self {
        Self::with_clock(lifecycle, settle_delay, SystemClock)
    }
}

impl<C: Clock> Upgrader<C> {
    pub fn with_clock(lifecycle: Lifecycle, settle_delay: Duration, clock: C) -> Self {
        Self {
            lifecycle,
            clock,
            settle_delay,
        }
    }

    /// Upgrade a single container: stop, remove container, remove image,
    /// deploy. Short-circuits on the first failed step.
    pub async fn upgrade_one(&self, task: &UpgradeTask) -> bool {
        let name = task.name.as_str();
        info!(container = name, "upgrading container");

        let ok = self
            .step(name, UpgradeState::Stopping, self.lifecycle.stop(name))
            .await
            && self
                .step(
                    name,
                    UpgradeState::RemovingContainer,
                    self.lifecycle.remove_container(name),
                )
                .await
            && self
                .step(
                    name,
                    UpgradeState::RemovingImage,
                    self.lifecycle.remove_image(&task.spec.image),
                )
                .await
            && self
                .step(
                    name,
                    UpgradeState::Deploying,
                    self.lifecycle.deploy(name, &task.spec),
                )
                .await;

        if ok {
            info!(container = name, state = %UpgradeState::Deployed, "container upgraded");
        }
        ok
    }

    /// Run one step of the transaction, logging the state transitions.
    async fn step<F>(&self, name: &str, state: UpgradeState, op: F) -> bool
    where
        F: Future<Output = bool>,
    {
        debug!(container = name, state = %state, "upgrade step");
        if op.await {
            if let Some(next) = state.on_success() {
                debug!(container = name, state = %next, "upgrade step done");
            }
            true
        } else {
            error!(
                container = name,
                failed_step = %state,
                state = %UpgradeState::Failed,
                "upgrade failed"
            );
            false
        }
    }

    /// Upgrade every task in order, aborting the batch on the first
    /// failure. Returns true only when every task succeeded.
    pub async fn upgrade_all(&self, tasks: &[UpgradeTask]) -> bool {
        info!(count = tasks.len(), "starting container upgrades");

        let mut completed = 0usize;
        for task in tasks {
            if !self.upgrade_one(task).await {
                error!(
                    container = %task.name,
                    completed,
                    total = tasks.len(),
                    "aborting remaining upgrades"
                );
                return false;
            }
            completed += 1;
            if task.settle {
                info!(
                    container = %task.name,
                    delay_secs = self.settle_delay.as_secs(),
                    "waiting for container to settle"
                );
                self.clock.sleep(self.settle_delay).await;
            }
        }

        info!(completed, total = tasks.len(), "all containers upgraded");
        true
    }
}

#[cfg(test)]
#[path = "upgrader_tests.rs"]
mod tests;
