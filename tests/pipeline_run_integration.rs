//! Behavioural integration tests for the run loop over memory adapters.
//!
//! These tests drive one idea across the whole board from scripted
//! generations alone: designed, reviewed, advanced, planned,
//! implemented, written up, reference-validated, and closed. They also
//! verify that a finished board stays untouched and that a run resumes
//! cleanly after an earlier one crashed between commit and exit.

#![expect(
    clippy::expect_used,
    reason = "Test code uses expect for assertion clarity"
)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockable::DefaultClock;
use rstest::rstest;

use vasari::engine::adapters::handlers::HandlerTable;
use vasari::engine::adapters::memory::InMemoryRunCoordination;
use vasari::engine::domain::{
    Checkpoint, RunLock, RunOutcome, RunPolicy, TaskDisposition, TaskId, TaskKind,
};
use vasari::engine::ports::{CheckpointRepository, TextGenerator};
use vasari::engine::services::{Orchestrator, TaskExecutor, TaskSelector};
use vasari::model::domain::{GeneratedText, ModelId};
use vasari::model::services::{ProviderError, ProviderResult};
use vasari::pipeline::adapters::memory::InMemoryBoard;
use vasari::pipeline::domain::{
    ArtifactFile, ArtifactKind, Idea, IdeaId, Points, RunId, Stage, StageThresholds, VersionToken,
};
use vasari::pipeline::ports::{AcceptAllHumanReviews, BoardRepository};
use vasari::pipeline::services::RepositoryStateStore;

const DESIGN: &str = "## Design\n\nPrune attention heads by spectral mass and track perplexity drift.";
const REVIEW: &str = "Measured and fair, with a thin results section.\nGrade: 7/10";
const PLAN: &str = "## Plan\n\n1. Rank heads by spectral mass.\n2. Prune and fine-tune.";
const CODE: &str = "import torch\n\n\ndef prune(model):\n    return model";
const PAPER: &str = "We prune attention heads ranked by spectral mass [1].\n\n\
    ## References\n\n\
    [1] A. Author, Pruning by spectral mass, https://example.org/pruning";

type TestOrchestrator =
    Orchestrator<InMemoryBoard, AcceptAllHumanReviews, DefaultClock, InMemoryRunCoordination>;

/// Queue-driven stand-in for the model provider. An empty queue behaves
/// like a provider whose attempt budget ran out.
struct ScriptedGenerator {
    replies: Mutex<VecDeque<String>>,
}

impl ScriptedGenerator {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|&reply| reply.to_owned()).collect()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, _prompt: &str, _max_tokens: u32) -> ProviderResult<GeneratedText> {
        let reply = self.replies.lock().expect("replies lock").pop_front();
        match reply {
            Some(text) => Ok(GeneratedText::new(
                ModelId::new("scripted-7b").expect("valid model id"),
                text,
            )),
            None => Err(ProviderError::AttemptsExhausted { attempts: 3 }),
        }
    }
}

fn idea_id() -> IdeaId {
    IdeaId::new("spectral-pruning").expect("valid idea id")
}

fn seed_board(board: &Arc<InMemoryBoard>) -> VersionToken {
    let idea = Idea::new(idea_id(), "Spectral pruning of attention heads", &DefaultClock)
        .expect("valid idea");
    board.seed_idea(idea).expect("idea seeds")
}

/// Gates are lowered to one half-point so a single model review opens
/// each stage.
fn orchestrator(
    board: &Arc<InMemoryBoard>,
    coordination: &Arc<InMemoryRunCoordination>,
    generator: Arc<ScriptedGenerator>,
) -> TestOrchestrator {
    let clock = Arc::new(DefaultClock);
    let store = RepositoryStateStore::new(
        Arc::clone(board),
        Arc::new(AcceptAllHumanReviews),
        Arc::clone(&clock),
    );
    let thresholds =
        StageThresholds::new(Points::from_half_points(1), Points::from_half_points(1));
    Orchestrator::new(
        store,
        Arc::clone(coordination),
        TaskSelector::new(thresholds),
        TaskExecutor::new(HandlerTable::with_defaults()),
        generator,
        clock,
        RunPolicy::default().with_worker_limit(1),
    )
}

fn committed_kinds(board: &Arc<InMemoryBoard>) -> Vec<ArtifactKind> {
    board
        .commit_log()
        .expect("commit log readable")
        .iter()
        .map(|record| record.kind)
        .collect()
}

fn long_ago(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, 1, 0, minute, 0)
        .single()
        .expect("valid test instant")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_seeded_idea_marches_from_backlog_to_done() {
    let board = Arc::new(InMemoryBoard::new());
    let coordination = Arc::new(InMemoryRunCoordination::new());
    let generator = Arc::new(ScriptedGenerator::new(&[
        DESIGN, REVIEW, PLAN, REVIEW, CODE, PAPER,
    ]));
    seed_board(&board);

    let driver = orchestrator(&board, &coordination, generator);
    let report = driver.run().await.expect("run succeeds");

    // Ten commits: four artifacts, two reviews, three advancements, and
    // the validation mark. The trailing brainstorm finds no scripted
    // reply and fails, which ends the run.
    assert_eq!(report.outcome(), &RunOutcome::Completed);
    assert_eq!(report.completed_count(), 10);
    assert_eq!(report.failed_count(), 1);
    let failed: Vec<TaskKind> = report
        .tasks()
        .iter()
        .filter(|record| !matches!(record.disposition(), TaskDisposition::Completed))
        .map(|record| record.kind())
        .collect();
    assert_eq!(failed, vec![TaskKind::BrainstormIdea]);

    let fetched = board.get_idea(&idea_id()).await.expect("idea readable");
    assert_eq!(fetched.idea.stage(), Stage::Done);
    assert!(fetched.idea.has_label("references-validated"));
    assert_eq!(
        committed_kinds(&board),
        vec![
            ArtifactKind::DesignDoc,
            ArtifactKind::ImplementationPlan,
            ArtifactKind::Code,
            ArtifactKind::Paper,
        ]
    );
    assert_eq!(
        coordination.stored_checkpoint().expect("checkpoint readable"),
        None
    );
    assert_eq!(coordination.held_lock().expect("lock readable"), None);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_finished_board_takes_no_further_writes() {
    let board = Arc::new(InMemoryBoard::new());
    let coordination = Arc::new(InMemoryRunCoordination::new());
    let generator = Arc::new(ScriptedGenerator::new(&[
        DESIGN, REVIEW, PLAN, REVIEW, CODE, PAPER,
    ]));
    seed_board(&board);

    let driver = orchestrator(&board, &coordination, generator);
    let first = driver.run().await.expect("first run succeeds");
    assert_eq!(first.outcome(), &RunOutcome::Completed);
    let version_after_first = board.get_idea(&idea_id()).await.expect("idea readable").version;
    let commits_after_first = committed_kinds(&board).len();

    let second = driver.run().await.expect("second run succeeds");

    assert_eq!(second.outcome(), &RunOutcome::Completed);
    assert_eq!(second.completed_count(), 0);
    let fetched = board.get_idea(&idea_id()).await.expect("idea readable");
    assert_eq!(fetched.idea.stage(), Stage::Done);
    assert_eq!(fetched.version, version_after_first);
    assert_eq!(committed_kinds(&board).len(), commits_after_first);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_run_resumes_cleanly_after_a_crash() {
    let board = Arc::new(InMemoryBoard::new());
    let coordination = Arc::new(InMemoryRunCoordination::new());
    let version = seed_board(&board);

    // Stage the wreckage of an earlier run: a committed design, the
    // checkpoint recording it, and the dead run's stale lock.
    let writer = RepositoryStateStore::new(
        Arc::clone(&board),
        Arc::new(AcceptAllHumanReviews),
        Arc::new(DefaultClock),
    );
    let file = ArtifactFile::new("design.md", DESIGN.to_owned()).expect("valid file");
    writer
        .commit_artifact(
            &idea_id(),
            &version,
            ArtifactKind::DesignDoc,
            vec![file],
            "Add design document for spectral-pruning",
        )
        .await
        .expect("design commits");
    let checkpoint = Checkpoint::new(
        RunId::new(),
        Some(TaskId::new("draft-design/spectral-pruning")),
        1,
        long_ago(5),
    );
    coordination
        .save_checkpoint(&checkpoint)
        .await
        .expect("checkpoint saves");
    coordination
        .seed_lock(RunLock::from_parts(
            "scheduler/crashed".to_owned(),
            long_ago(0),
            long_ago(30),
        ))
        .expect("lock seeds");

    // Resume from the review onwards; no second design is generated.
    let generator = Arc::new(ScriptedGenerator::new(&[REVIEW, PLAN, REVIEW, CODE, PAPER]));
    let driver = orchestrator(&board, &coordination, generator);
    let report = driver.run().await.expect("run succeeds");

    assert_eq!(report.outcome(), &RunOutcome::Completed);
    assert_eq!(report.completed_count(), 9);
    assert_eq!(report.failed_count(), 1);

    let fetched = board.get_idea(&idea_id()).await.expect("idea readable");
    assert_eq!(fetched.idea.stage(), Stage::Done);
    assert_eq!(
        committed_kinds(&board),
        vec![
            ArtifactKind::DesignDoc,
            ArtifactKind::ImplementationPlan,
            ArtifactKind::Code,
            ArtifactKind::Paper,
        ]
    );
    assert_eq!(
        coordination.stored_checkpoint().expect("checkpoint readable"),
        None
    );
    assert_eq!(coordination.held_lock().expect("lock readable"), None);
}
