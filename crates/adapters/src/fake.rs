// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory engine double for tests.
//!
//! Holds containers and images as plain maps, records every call for
//! assertions, and supports per-operation failure injection plus scripted
//! pull event streams. Clones share state.

use crate::engine::{ContainerApi, ContainerInfo, EngineError, RunRequest};
use async_trait::async_trait;
use capstan_core::PullEvent;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One recorded engine call, in invocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Ping,
    Inspect(String),
    Stop(String),
    RemoveContainer(String),
    RemoveImage(String),
    Pull(String),
    PullStream(String),
    Run(RunRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Op {
    Ping,
    Inspect,
    Stop,
    RemoveContainer,
    RemoveImage,
    Pull,
    PullStream,
    Run,
}

#[derive(Default)]
struct FakeState {
    /// name -> running
    containers: HashMap<String, bool>,
    images: HashSet<String>,
    pull_scripts: HashMap<String, Vec<Result<PullEvent, EngineError>>>,
    failures: HashSet<(Op, String)>,
    calls: Vec<EngineCall>,
}

/// Fake [`ContainerApi`] with scripted behavior.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_running_container(&self, name: &str) {
        self.state.lock().containers.insert(name.to_string(), true);
    }

    pub fn add_stopped_container(&self, name: &str) {
        self.state.lock().containers.insert(name.to_string(), false);
    }

    pub fn add_image(&self, image: &str) {
        self.state.lock().images.insert(image.to_string());
    }

    /// Events the next `pull_events` call for `image` will yield.
    pub fn script_pull(&self, image: &str, events: Vec<Result<PullEvent, EngineError>>) {
        self.state.lock().pull_scripts.insert(image.to_string(), events);
    }

    pub fn fail_ping(&self) {
        self.fail(Op::Ping, "");
    }

    pub fn fail_inspect(&self, name: &str) {
        self.fail(Op::Inspect, name);
    }

    pub fn fail_stop(&self, name: &str) {
        self.fail(Op::Stop, name);
    }

    pub fn fail_remove_container(&self, name: &str) {
        self.fail(Op::RemoveContainer, name);
    }

    pub fn fail_remove_image(&self, image: &str) {
        self.fail(Op::RemoveImage, image);
    }

    pub fn fail_pull(&self, image: &str) {
        self.fail(Op::Pull, image);
    }

    pub fn fail_pull_stream(&self, image: &str) {
        self.fail(Op::PullStream, image);
    }

    pub fn fail_run(&self, name: &str) {
        self.fail(Op::Run, name);
    }

    pub fn has_container(&self, name: &str) -> bool {
        self.state.lock().containers.contains_key(name)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state.lock().containers.get(name).copied().unwrap_or(false)
    }

    pub fn has_image(&self, image: &str) -> bool {
        self.state.lock().images.contains(image)
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.lock().calls.clone()
    }

    /// The most recent `run` request, if any.
    pub fn last_run(&self) -> Option<RunRequest> {
        self.state.lock().calls.iter().rev().find_map(|call| match call {
            EngineCall::Run(req) => Some(req.clone()),
            _ => None,
        })
    }

    /// Whether any recorded call referenced `target` as a container name
    /// or image.
    pub fn touched(&self, target: &str) -> bool {
        self.state.lock().calls.iter().any(|call| match call {
            EngineCall::Ping => false,
            EngineCall::Inspect(name)
            | EngineCall::Stop(name)
            | EngineCall::RemoveContainer(name)
            | EngineCall::RemoveImage(name)
            | EngineCall::Pull(name)
            | EngineCall::PullStream(name) => name == target,
            EngineCall::Run(req) => req.name == target || req.image == target,
        })
    }

    fn fail(&self, op: Op, target: &str) {
        self.state.lock().failures.insert((op, target.to_string()));
    }

    fn check(&self, op: Op, target: &str) -> Result<(), EngineError> {
        if self.state.lock().failures.contains(&(op, target.to_string())) {
            return Err(EngineError::Api(format!("injected failure for {target}")));
        }
        Ok(())
    }

    fn record(&self, call: EngineCall) {
        self.state.lock().calls.push(call);
    }
}

#[async_trait]
impl ContainerApi for FakeEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Ping);
        self.check(Op::Ping, "")
    }

    async fn inspect(&self, name: &str) -> Result<ContainerInfo, EngineError> {
        self.record(EngineCall::Inspect(name.to_string()));
        self.check(Op::Inspect, name)?;
        match self.state.lock().containers.get(name) {
            Some(&running) => Ok(ContainerInfo { running }),
            None => Err(EngineError::NotFound(format!("no such container: {name}"))),
        }
    }

    async fn stop(&self, name: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Stop(name.to_string()));
        self.check(Op::Stop, name)?;
        match self.state.lock().containers.get_mut(name) {
            Some(running) => {
                *running = false;
                Ok(())
            }
            None => Err(EngineError::NotFound(format!("no such container: {name}"))),
        }
    }

    async fn remove_container(&self, name: &str) -> Result<(), EngineError> {
        self.record(EngineCall::RemoveContainer(name.to_string()));
        self.check(Op::RemoveContainer, name)?;
        match self.state.lock().containers.remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("no such container: {name}"))),
        }
    }

    async fn remove_image(&self, image: &str) -> Result<(), EngineError> {
        self.record(EngineCall::RemoveImage(image.to_string()));
        self.check(Op::RemoveImage, image)?;
        if self.state.lock().images.remove(image) {
            Ok(())
        } else {
            Err(EngineError::NotFound(format!("no such image: {image}")))
        }
    }

    async fn pull(&self, image: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Pull(image.to_string()));
        self.check(Op::Pull, image)?;
        self.state.lock().images.insert(image.to_string());
        Ok(())
    }

    fn pull_events<'a>(&'a self, image: &str) -> BoxStream<'a, Result<PullEvent, EngineError>> {
        self.record(EngineCall::PullStream(image.to_string()));
        if self.check(Op::PullStream, image).is_err() {
            let failure = EngineError::Api(format!("injected stream failure for {image}"));
            return stream::iter(vec![Err(failure)]).boxed();
        }
        let mut state = self.state.lock();
        state.images.insert(image.to_string());
        let events = state.pull_scripts.remove(image).unwrap_or_else(|| {
            vec![
                Ok(PullEvent::new(format!("Pulling from {image}"), None)),
                Ok(PullEvent::new(
                    format!("Status: Downloaded newer image for {image}:latest"),
                    None,
                )),
            ]
        });
        stream::iter(events).boxed()
    }

    async fn run(&self, req: &RunRequest) -> Result<(), EngineError> {
        self.record(EngineCall::Run(req.clone()));
        self.check(Op::Run, &req.name)?;
        self.state.lock().containers.insert(req.name.clone(), true);
        Ok(())
    }
}
