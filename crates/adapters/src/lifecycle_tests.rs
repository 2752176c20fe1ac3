// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::{EngineCall, FakeEngine};
use capstan_core::{ContainerSpec, PullEvent};
use indexmap::IndexMap;

fn lifecycle() -> (Lifecycle, FakeEngine) {
    let engine = FakeEngine::new();
    (Lifecycle::new(Arc::new(engine.clone())), engine)
}

#[tokio::test]
async fn stop_is_idempotent_for_running_container() {
    let (lifecycle, engine) = lifecycle();
    engine.add_running_container("stack-api");

    assert!(lifecycle.stop("stack-api").await);
    assert!(!engine.is_running("stack-api"));
    // second stop hits the not-running branch, still a success
    assert!(lifecycle.stop("stack-api").await);
}

#[tokio::test]
async fn stop_of_unknown_container_succeeds_without_stop_call() {
    let (lifecycle, engine) = lifecycle();
    assert!(lifecycle.stop("ghost").await);
    assert_eq!(engine.calls(), vec![EngineCall::Inspect("ghost".to_string())]);
}

#[tokio::test]
async fn stop_reports_engine_errors_as_failure() {
    let (lifecycle, engine) = lifecycle();
    engine.add_running_container("stack-api");
    engine.fail_stop("stack-api");
    assert!(!lifecycle.stop("stack-api").await);
}

#[tokio::test]
async fn stop_reports_inspect_errors_as_failure() {
    let (lifecycle, engine) = lifecycle();
    engine.fail_inspect("stack-api");
    assert!(!lifecycle.stop("stack-api").await);
}

#[tokio::test]
async fn remove_container_is_idempotent() {
    let (lifecycle, engine) = lifecycle();
    engine.add_stopped_container("stack-api");

    assert!(lifecycle.remove_container("stack-api").await);
    assert!(!engine.has_container("stack-api"));
    assert!(lifecycle.remove_container("stack-api").await);
}

#[tokio::test]
async fn remove_container_reports_engine_errors_as_failure() {
    let (lifecycle, engine) = lifecycle();
    engine.add_stopped_container("stack-api");
    engine.fail_remove_container("stack-api");
    assert!(!lifecycle.remove_container("stack-api").await);
}

#[tokio::test]
async fn remove_image_succeeds_when_absent() {
    let (lifecycle, _engine) = lifecycle();
    assert!(lifecycle.remove_image("registry.test/app").await);
}

#[tokio::test]
async fn remove_image_removes_existing_reference() {
    let (lifecycle, engine) = lifecycle();
    engine.add_image("registry.test/app");
    assert!(lifecycle.remove_image("registry.test/app").await);
    assert!(!engine.has_image("registry.test/app"));
}

#[tokio::test]
async fn remove_image_reports_engine_errors_as_failure() {
    let (lifecycle, engine) = lifecycle();
    engine.add_image("registry.test/app");
    engine.fail_remove_image("registry.test/app");
    assert!(!lifecycle.remove_image("registry.test/app").await);
}

#[tokio::test]
async fn pull_terminates_stream_at_final_status() {
    let (lifecycle, engine) = lifecycle();
    // an error after the terminal event must never be polled; the blocking
    // fallback is also poisoned so any fallback would fail the pull
    engine.script_pull(
        "registry.test/app",
        vec![
            Ok(PullEvent::new("Pulling fs layer", Some("a"))),
            Ok(PullEvent::new("Pull complete", Some("a"))),
            Ok(PullEvent::new(
                "Status: Image is up to date for registry.test/app:latest",
                None,
            )),
            Err(EngineError::Api("stream kept going".to_string())),
        ],
    );
    engine.fail_pull("registry.test/app");

    assert!(lifecycle.pull("registry.test/app").await);
    assert_eq!(
        engine.calls(),
        vec![EngineCall::PullStream("registry.test/app".to_string())]
    );
}

#[tokio::test]
async fn pull_counts_layers_from_raw_status_records() {
    let (lifecycle, engine) = lifecycle();
    // the wire format: one JSON record per status line
    let records = [
        r#"{"status":"Pulling from registry.test/app"}"#,
        r#"{"status":"Pulling fs layer","id":"a"}"#,
        r#"{"status":"Pulling fs layer","id":"b"}"#,
        r#"{"status":"Pull complete","id":"a"}"#,
        r#"{"status":"Pull complete","id":"b"}"#,
        r#"{"status":"Status: Downloaded newer image for registry.test/app:latest"}"#,
    ];
    let events = records
        .iter()
        .map(|record| Ok(serde_json::from_str::<PullEvent>(record).unwrap()))
        .collect();
    engine.script_pull("registry.test/app", events);

    assert!(lifecycle.pull("registry.test/app").await);
}

#[tokio::test]
async fn pull_falls_back_to_blocking_on_stream_error() {
    let (lifecycle, engine) = lifecycle();
    engine.fail_pull_stream("registry.test/app");

    assert!(lifecycle.pull("registry.test/app").await);
    assert_eq!(
        engine.calls(),
        vec![
            EngineCall::PullStream("registry.test/app".to_string()),
            EngineCall::Pull("registry.test/app".to_string()),
        ]
    );
}

#[tokio::test]
async fn pull_fails_when_stream_and_fallback_both_fail() {
    let (lifecycle, engine) = lifecycle();
    engine.fail_pull_stream("registry.test/app");
    engine.fail_pull("registry.test/app");
    assert!(!lifecycle.pull("registry.test/app").await);
}

#[tokio::test]
async fn pull_survives_mid_stream_error_via_fallback() {
    let (lifecycle, engine) = lifecycle();
    engine.script_pull(
        "registry.test/app",
        vec![
            Ok(PullEvent::new("Pulling fs layer", Some("a"))),
            Err(EngineError::Api("connection reset".to_string())),
        ],
    );
    assert!(lifecycle.pull("registry.test/app").await);
    assert!(engine
        .calls()
        .contains(&EngineCall::Pull("registry.test/app".to_string())));
}

#[tokio::test]
async fn deploy_pulls_then_runs_the_translated_spec() {
    let (lifecycle, engine) = lifecycle();
    let mut volumes = IndexMap::new();
    volumes.insert(r"C:\Users\dev\stack\data".to_string(), "/data".to_string());
    let mut ports = IndexMap::new();
    ports.insert("8000".to_string(), "8000".to_string());
    let spec = ContainerSpec::builder()
        .name("stack-api")
        .image("registry.test/app")
        .volumes(volumes)
        .ports(ports)
        .build();

    assert!(lifecycle.deploy("stack-api", &spec).await);
    assert!(engine.is_running("stack-api"));

    let req = engine.last_run().expect("run was called");
    assert_eq!(req.binds, ["C:/Users/dev/stack/data:/data:rw"]);
    assert_eq!(req.ports, [("8000".to_string(), "8000".to_string())]);
}

#[tokio::test]
async fn deploy_fails_without_running_when_pull_fails() {
    let (lifecycle, engine) = lifecycle();
    engine.fail_pull_stream("registry.test/app");
    engine.fail_pull("registry.test/app");
    let spec = ContainerSpec::builder().name("stack-api").image("registry.test/app").build();

    assert!(!lifecycle.deploy("stack-api", &spec).await);
    assert!(engine.last_run().is_none());
}

#[tokio::test]
async fn deploy_reports_run_errors_as_failure() {
    let (lifecycle, engine) = lifecycle();
    engine.fail_run("stack-api");
    let spec = ContainerSpec::builder().name("stack-api").image("registry.test/app").build();
    assert!(!lifecycle.deploy("stack-api", &spec).await);
}
