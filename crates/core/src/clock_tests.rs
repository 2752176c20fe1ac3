// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_returns_increasing_time() {
    let clock = SystemClock;
    let t1 = clock.now();
    std::thread::sleep(Duration::from_millis(1));
    let t2 = clock.now();
    assert!(t2 > t1);
}

#[test]
fn fake_clock_can_be_advanced() {
    let clock = FakeClock::new();
    let t1 = clock.now();
    clock.advance(Duration::from_secs(60));
    let t2 = clock.now();
    assert!(t2.duration_since(t1) >= Duration::from_secs(60));
}

#[test]
fn fake_clock_is_cloneable_and_shared() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    let t1 = clock1.now();
    clock2.advance(Duration::from_secs(30));
    let t2 = clock1.now();
    assert!(t2.duration_since(t1) >= Duration::from_secs(30));
}

#[tokio::test]
async fn fake_clock_records_sleeps_without_waiting() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.sleep(Duration::from_secs(10)).await;
    clock.sleep(Duration::from_secs(3)).await;
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(10), Duration::from_secs(3)]
    );
    assert!(clock.now().duration_since(before) >= Duration::from_secs(13));
}

#[tokio::test]
async fn fake_clock_sleeps_visible_across_clones() {
    let clock1 = FakeClock::new();
    let clock2 = clock1.clone();
    clock2.sleep(Duration::from_secs(5)).await;
    assert_eq!(clock1.sleeps(), vec![Duration::from_secs(5)]);
}
