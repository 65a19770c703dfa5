//! Tests for in-memory run lock and checkpoint storage.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;

use crate::engine::adapters::memory::InMemoryRunCoordination;
use crate::engine::domain::{Checkpoint, RunLock};
use crate::engine::ports::run_coordination::{
    CheckpointRepository, CoordinationError, RunLockRepository,
};
use crate::pipeline::domain::RunId;

fn moment(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 11, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn lock_at(holder: &str, minute: u32) -> RunLock {
    RunLock::new(holder, moment(minute), Duration::from_secs(600))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn fresh_locks_acquire_and_release() {
    let coordination = InMemoryRunCoordination::new();
    let lock = lock_at("scheduler/one", 0);

    coordination.acquire_lock(&lock).await.expect("lock acquired");
    assert_eq!(
        coordination
            .held_lock()
            .expect("lock readable")
            .map(|held| held.holder().to_owned()),
        Some("scheduler/one".to_owned())
    );

    coordination.release_lock(&lock).await.expect("lock released");
    assert_eq!(coordination.held_lock().expect("lock readable"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn live_foreign_locks_block_acquisition() {
    let coordination = InMemoryRunCoordination::new();
    coordination
        .acquire_lock(&lock_at("scheduler/one", 0))
        .await
        .expect("first lock acquired");

    let error = coordination
        .acquire_lock(&lock_at("scheduler/two", 5))
        .await
        .expect_err("second lock blocked");
    let CoordinationError::LockHeld { holder } = error else {
        panic!("expected a held-lock error");
    };
    assert_eq!(holder, "scheduler/one");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn expired_foreign_locks_are_reclaimed() {
    let coordination = InMemoryRunCoordination::new();
    coordination
        .seed_lock(RunLock::from_parts(
            "scheduler/stale".to_owned(),
            moment(0),
            moment(10),
        ))
        .expect("lock seeded");

    coordination
        .acquire_lock(&lock_at("scheduler/two", 15))
        .await
        .expect("expired lock reclaimed");
    assert_eq!(
        coordination
            .held_lock()
            .expect("lock readable")
            .map(|held| held.holder().to_owned()),
        Some("scheduler/two".to_owned())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn the_holder_may_reacquire_its_own_lock() {
    let coordination = InMemoryRunCoordination::new();
    coordination
        .acquire_lock(&lock_at("scheduler/one", 0))
        .await
        .expect("first acquisition");

    coordination
        .acquire_lock(&lock_at("scheduler/one", 2))
        .await
        .expect("reacquisition by the holder");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn releasing_anothers_lock_is_ignored() {
    let coordination = InMemoryRunCoordination::new();
    coordination
        .acquire_lock(&lock_at("scheduler/one", 0))
        .await
        .expect("lock acquired");

    coordination
        .release_lock(&lock_at("scheduler/two", 1))
        .await
        .expect("mismatched release is not an error");
    assert_eq!(
        coordination
            .held_lock()
            .expect("lock readable")
            .map(|held| held.holder().to_owned()),
        Some("scheduler/one".to_owned())
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn checkpoints_round_trip_and_clear() {
    let coordination = InMemoryRunCoordination::new();
    let checkpoint = Checkpoint::new(RunId::new(), None, 4, moment(3));

    coordination
        .save_checkpoint(&checkpoint)
        .await
        .expect("checkpoint saved");
    assert_eq!(
        coordination.load_checkpoint().await.expect("checkpoint readable"),
        Some(checkpoint)
    );

    coordination
        .clear_checkpoint()
        .await
        .expect("checkpoint cleared");
    assert_eq!(
        coordination.load_checkpoint().await.expect("checkpoint readable"),
        None
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn clearing_a_missing_checkpoint_is_idempotent() {
    let coordination = InMemoryRunCoordination::new();
    coordination
        .clear_checkpoint()
        .await
        .expect("clearing nothing succeeds");
    assert_eq!(
        coordination.load_checkpoint().await.expect("checkpoint readable"),
        None
    );
}
