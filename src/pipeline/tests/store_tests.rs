//! Tests for the state store's weighing, retry, and labelling behaviour.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

use crate::pipeline::adapters::memory::InMemoryBoard;
use crate::pipeline::domain::{
    ArtifactKind, Idea, IdeaId, Points, Review, ReviewAuthor, ReviewGrade, VersionToken,
};
use crate::pipeline::ports::review_policy::{AcceptAllHumanReviews, SubstantiveBodyPolicy};
use crate::pipeline::services::{RepositoryStateStore, StoreError};

type TestStore = RepositoryStateStore<InMemoryBoard, AcceptAllHumanReviews, DefaultClock>;

struct Harness {
    board: Arc<InMemoryBoard>,
    store: TestStore,
}

#[fixture]
fn harness() -> Harness {
    let board = Arc::new(InMemoryBoard::new());
    let store = RepositoryStateStore::new(
        Arc::clone(&board),
        Arc::new(AcceptAllHumanReviews),
        Arc::new(DefaultClock),
    );
    Harness { board, store }
}

fn moment(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 11, minute, 0)
        .single()
        .expect("valid timestamp")
}

fn idea_id() -> IdeaId {
    IdeaId::new("spectral-pruning").expect("valid idea id")
}

fn seeded_idea(board: &InMemoryBoard) -> (IdeaId, VersionToken) {
    let idea = Idea::new(idea_id(), "Spectral pruning of attention heads", &DefaultClock)
        .expect("valid idea");
    let version = board.seed_idea(idea).expect("seeded");
    (idea_id(), version)
}

fn human_review(body: &str, minute: u32) -> Review {
    Review::new(
        ReviewAuthor::human("asha").expect("valid author"),
        ReviewGrade::new(7).expect("valid grade"),
        ArtifactKind::DesignDoc,
        body,
        moment(minute),
    )
    .expect("valid review")
}

fn model_review(minute: u32) -> Review {
    Review::new(
        ReviewAuthor::llm("hermes-reviewer").expect("valid author"),
        ReviewGrade::new(6).expect("valid grade"),
        ArtifactKind::DesignDoc,
        "Ok.",
        moment(minute),
    )
    .expect("valid review")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn register_and_fetch_through_the_store(harness: Harness) {
    let idea = Idea::new(idea_id(), "Spectral pruning of attention heads", &DefaultClock)
        .expect("valid idea");
    harness.store.register_idea(&idea).await.expect("registered");

    let fetched = harness.store.get_idea(idea.id()).await.expect("fetched");
    assert_eq!(fetched.idea.title(), "Spectral pruning of attention heads");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unsubstantive_human_reviews_earn_no_points() {
    let board = Arc::new(InMemoryBoard::new());
    let store = RepositoryStateStore::new(
        Arc::clone(&board),
        Arc::new(SubstantiveBodyPolicy::new(60)),
        Arc::new(DefaultClock),
    );
    let (id, version) = seeded_idea(&board);

    let terse = store
        .append_review(&id, &version, &human_review("Looks fine.", 1))
        .await
        .expect("review recorded");
    assert_eq!(terse.total, Points::ZERO);

    let substantive = store
        .append_review(
            &id,
            &terse.version,
            &human_review(
                "The sweep design isolates the learning-rate effect convincingly \
                 and the chosen baselines are sound.",
                2,
            ),
        )
        .await
        .expect("review recorded");
    assert_eq!(substantive.total, Points::from_half_points(2));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn model_reviews_keep_their_weight_under_a_strict_policy() {
    let board = Arc::new(InMemoryBoard::new());
    let store = RepositoryStateStore::new(
        Arc::clone(&board),
        Arc::new(SubstantiveBodyPolicy::new(60)),
        Arc::new(DefaultClock),
    );
    let (id, version) = seeded_idea(&board);

    let receipt = store
        .append_review(&id, &version, &model_review(1))
        .await
        .expect("review recorded");
    assert_eq!(receipt.total, Points::from_half_points(1));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rate_limited_reads_honour_the_retry_delay(harness: Harness) {
    let (id, _) = seeded_idea(&harness.board);
    for _ in 0..2 {
        harness
            .board
            .schedule_rate_limit("get_idea", Duration::from_millis(25))
            .expect("throttle scheduled");
    }

    let started = Instant::now();
    harness.store.get_idea(&id).await.expect("retries succeed");
    let elapsed = started.elapsed();
    assert!(
        elapsed >= Duration::from_millis(50),
        "retries returned after {elapsed:?}, before both delays elapsed"
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn a_thirty_second_throttle_is_waited_out(harness: Harness) {
    let (id, _) = seeded_idea(&harness.board);
    harness
        .board
        .schedule_rate_limit("get_idea", Duration::from_secs(30))
        .expect("throttle scheduled");

    let started = tokio::time::Instant::now();
    harness.store.get_idea(&id).await.expect("retry succeeds");
    assert!(
        started.elapsed() >= Duration::from_secs(30),
        "the full advertised delay must pass before the retry"
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn persistent_throttling_exhausts_the_retry_budget(harness: Harness) {
    let (id, _) = seeded_idea(&harness.board);
    for _ in 0..3 {
        harness
            .board
            .schedule_rate_limit("get_idea", Duration::from_millis(5))
            .expect("throttle scheduled");
    }

    let result = harness.store.get_idea(&id).await;
    assert!(matches!(
        result,
        Err(StoreError::RateLimitExhausted { attempts: 3, ref operation })
            if operation == "get_idea"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_saves_surface_a_conflict(harness: Harness) {
    let (id, stale) = seeded_idea(&harness.board);
    let fetched = harness.store.get_idea(&id).await.expect("fetched");
    harness
        .store
        .save_idea(&id, &stale, &fetched.idea)
        .await
        .expect("first save accepted");

    let result = harness.store.save_idea(&id, &stale, &fetched.idea).await;
    assert!(matches!(result, Err(StoreError::Conflict { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_failures_label_and_annotate_the_idea(harness: Harness) {
    let (id, _) = seeded_idea(&harness.board);

    harness
        .store
        .record_task_failure(&id, "implement", "generation returned an empty body")
        .await
        .expect("failure recorded");

    let fetched = harness.store.get_idea(&id).await.expect("fetched");
    assert!(fetched.idea.has_label("task-failed/implement"));
    let note = harness
        .board
        .file("notes/spectral-pruning/0.md")
        .expect("files readable")
        .expect("note written");
    assert!(note.contains("generation returned an empty body"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reference_validation_marker_is_idempotent(harness: Harness) {
    let (id, _) = seeded_idea(&harness.board);

    harness
        .store
        .mark_references_validated(&id)
        .await
        .expect("marker applied");
    harness
        .store
        .mark_references_validated(&id)
        .await
        .expect("second call is a no-op");

    let fetched = harness.store.get_idea(&id).await.expect("fetched");
    assert!(fetched.idea.has_label("references-validated"));
    assert_eq!(fetched.version, VersionToken::new("v2"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn commits_without_files_are_rejected(harness: Harness) {
    let (id, version) = seeded_idea(&harness.board);

    let result = harness
        .store
        .commit_artifact(&id, &version, ArtifactKind::DesignDoc, vec![], "Add design")
        .await;
    assert!(matches!(
        result,
        Err(StoreError::Domain(
            crate::pipeline::domain::PipelineDomainError::EmptyCommit { .. }
        ))
    ));
}
