//! Contract Test: Poll Loop
//!
//! Constraints verified:
//! - The first cycle runs immediately, then once per interval
//! - A failing cycle never stops the loop
//! - Cancellation ends the loop, including a cycle that is mid-upsert
//! - Loops for different records do not affect each other
//!
//! Time is paused, so intervals elapse instantly and deterministically.

mod common;

use common::*;
use dns_updater_core::{CancellationToken, PollLoop, UpdateCycle};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

const INTERVAL: Duration = Duration::from_secs(120);

fn spawn_loop(cycle: UpdateCycle, cancel: &CancellationToken) -> JoinHandle<()> {
    let poll = PollLoop::new(cycle, INTERVAL).unwrap();
    let cancel = cancel.clone();
    tokio::spawn(async move { poll.run(cancel).await })
}

#[tokio::test(start_paused = true)]
async fn first_cycle_runs_immediately() {
    let resolver = ScriptedResolver::always("198.51.100.7");
    let updater = RecordingUpdater::new();
    let store = RecordingStore::empty();
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(resolver.calls(), 1);
    assert_eq!(store.value(), "198.51.100.7");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cycles_follow_the_interval() {
    let resolver = ScriptedResolver::always("198.51.100.7");
    let updater = RecordingUpdater::new();
    let store = RecordingStore::empty();
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);

    // Ticks at 0, 1x and 2x the interval
    tokio::time::sleep(INTERVAL * 5 / 2).await;
    assert_eq!(resolver.calls(), 3);

    // Only the first cycle saw a change
    assert_eq!(updater.call_count(), 1);
    assert_eq!(store.writes().len(), 1);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn new_ip_is_picked_up_on_next_tick() {
    let resolver = ScriptedResolver::sequence(&["198.51.100.7", "198.51.100.9"]);
    let updater = RecordingUpdater::new();
    let store = RecordingStore::empty();
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);
    tokio::time::sleep(INTERVAL * 3 / 2).await;

    let applied: Vec<String> = updater.calls().into_iter().map(|c| c.ip).collect();
    assert_eq!(applied, vec!["198.51.100.7", "198.51.100.9"]);
    assert_eq!(store.value(), "198.51.100.9");

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn failing_cycles_keep_the_loop_alive() {
    let resolver = ScriptedResolver::failing(network_down);
    let updater = RecordingUpdater::new();
    let store = RecordingStore::empty();
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);
    tokio::time::sleep(INTERVAL * 5 / 2).await;

    assert_eq!(resolver.calls(), 3, "every tick retried despite failures");
    assert!(!handle.is_finished());
    assert_eq!(updater.call_count(), 0);

    cancel.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_an_idle_loop() {
    let resolver = ScriptedResolver::always("198.51.100.7");
    let updater = RecordingUpdater::new();
    let store = RecordingStore::empty();
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);
    tokio::time::sleep(INTERVAL / 2).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("loop should stop promptly")
        .unwrap();

    // No further cycles after shutdown
    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(resolver.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_aborts_an_in_flight_upsert() {
    let resolver = ScriptedResolver::always("198.51.100.9");
    let updater = ParkedUpdater::default();
    let store = RecordingStore::holding("198.51.100.7");
    let cancel = CancellationToken::new();

    let handle = spawn_loop(cycle_with(&resolver, &updater, &store), &cancel);
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(updater.started(), 1, "upsert should be parked");

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("parked upsert should be aborted")
        .unwrap();

    assert!(store.writes().is_empty());
    assert_eq!(store.value(), "198.51.100.7");
}

#[tokio::test(start_paused = true)]
async fn loops_for_different_records_are_independent() {
    let resolver = ScriptedResolver::always("198.51.100.7");
    let cancel = CancellationToken::new();

    let broken = RecordingUpdater::new();
    broken.fail_with(provider_rejected);
    let broken_store = RecordingStore::empty();

    let healthy = RecordingUpdater::new();
    let healthy_store = RecordingStore::empty();

    let shared: Arc<ScriptedResolver> = Arc::new(resolver.clone());
    let broken_cycle = UpdateCycle::new(
        shared.clone(),
        Box::new(broken.clone()),
        Box::new(broken_store.clone()),
        host_target(),
    );
    let healthy_cycle = UpdateCycle::new(
        shared,
        Box::new(healthy.clone()),
        Box::new(healthy_store.clone()),
        host_target(),
    );

    let first = spawn_loop(broken_cycle, &cancel);
    let second = spawn_loop(healthy_cycle, &cancel);
    tokio::time::sleep(INTERVAL * 3 / 2).await;

    assert_eq!(broken.call_count(), 2, "broken record retried each tick");
    assert!(broken_store.writes().is_empty());

    assert_eq!(healthy.call_count(), 1);
    assert_eq!(healthy_store.value(), "198.51.100.7");

    cancel.cancel();
    first.await.unwrap();
    second.await.unwrap();
}

#[test]
fn zero_interval_is_rejected() {
    let resolver = ScriptedResolver::always("198.51.100.7");
    let cycle = cycle_with(&resolver, &RecordingUpdater::new(), &RecordingStore::empty());

    assert!(PollLoop::new(cycle, Duration::ZERO).is_err());
}
