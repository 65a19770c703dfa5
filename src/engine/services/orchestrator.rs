//! The run loop: analyze, select, execute, commit, checkpoint.

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use mockable::Clock;
use tokio::time::{Instant, sleep_until};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::engine::domain::{
    Checkpoint, ProjectState, RunLock, RunOutcome, RunPhase, RunPolicy, RunReport, Task,
    TaskEffect, TaskError, TaskId, TaskKind, TaskRecord, TaskResult,
};
use crate::engine::ports::{
    CheckpointRepository, CoordinationError, HandlerContext, RunLockRepository, TextGenerator,
};
use crate::pipeline::domain::{ArtifactKind, Idea, IdeaId, RunId};
use crate::pipeline::ports::{BoardRepository, HumanReviewPolicy, VersionedIdea};
use crate::pipeline::services::{RepositoryStateStore, StoreError};

use super::{StateAnalyzer, TaskExecutor, TaskSelector};

/// Error raised before a run could start.
///
/// Once a run holds the lock it never fails outright; fatal conditions
/// are reported through [`RunOutcome::Aborted`] instead so the caller
/// always receives the ledger of whatever work was done.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    /// The coordination backend failed while taking the run lock.
    #[error(transparent)]
    Coordination(#[from] CoordinationError),
}

/// Drives complete runs over the board.
///
/// Each run loops through the engine phases until no task is selectable,
/// the wall-clock budget expires, or a fatal condition strikes. Task
/// effects are committed under version tokens; a checkpoint is saved
/// after every cycle that committed work, and cleared when a run ends
/// with nothing left to do.
pub struct Orchestrator<B, P, C, R> {
    store: RepositoryStateStore<B, P, C>,
    coordination: Arc<R>,
    selector: TaskSelector,
    executor: TaskExecutor,
    generator: Arc<dyn TextGenerator>,
    clock: Arc<C>,
    policy: RunPolicy,
}

impl<B, P, C, R> fmt::Debug for Orchestrator<B, P, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// How one cycle of the run loop ended.
enum CycleEnd {
    /// Work was attempted; run another cycle.
    Continue,
    /// Nothing was selectable; the run is done.
    Completed,
    /// A fatal condition ended the run.
    Aborted(String),
}

/// Why a task's effect could not be committed.
enum CommitError {
    /// The run cannot safely continue.
    Fatal(String),
    /// The effect was rejected; the run carries on without it.
    Rejected(String),
    /// The board throttled the write past its retry budget.
    Throttled(String),
}

impl<B, P, C, R> Orchestrator<B, P, C, R>
where
    B: BoardRepository,
    P: HumanReviewPolicy,
    C: Clock + Send + Sync,
    R: RunLockRepository + CheckpointRepository,
{
    /// Assembles an orchestrator from its collaborators.
    #[must_use]
    pub const fn new(
        store: RepositoryStateStore<B, P, C>,
        coordination: Arc<R>,
        selector: TaskSelector,
        executor: TaskExecutor,
        generator: Arc<dyn TextGenerator>,
        clock: Arc<C>,
        policy: RunPolicy,
    ) -> Self {
        Self {
            store,
            coordination,
            selector,
            executor,
            generator,
            clock,
            policy,
        }
    }

    /// Executes one complete run and reports what happened.
    ///
    /// Returns `Err` only when the coordination backend fails before
    /// the run starts. A lock already held by another run is not an
    /// error; the report carries [`RunOutcome::LockHeld`] and no work
    /// is attempted.
    pub async fn run(&self) -> Result<RunReport, OrchestratorError> {
        let run = RunId::new();
        let span = info_span!("run", id = %run);
        self.drive(run).instrument(span).await
    }

    async fn drive(&self, run: RunId) -> Result<RunReport, OrchestratorError> {
        let holder = format!("scheduler/{run}");
        let lock = RunLock::new(&holder, self.clock.utc(), self.policy.lock_ttl());
        match self.coordination.acquire_lock(&lock).await {
            Ok(()) => info!(holder = %lock.holder(), "run lock acquired"),
            Err(CoordinationError::LockHeld { holder: current }) => {
                info!(holder = %current, "run lock already held, standing down");
                return Ok(RunReport::new(
                    run,
                    RunOutcome::LockHeld { holder: current },
                    Vec::new(),
                    vec![RunPhase::Idle],
                ));
            }
            Err(error) => return Err(error.into()),
        }
        let report = self.drive_locked(run).await;
        if let Err(error) = self.coordination.release_lock(&lock).await {
            warn!(%error, "failed to release the run lock");
        }
        Ok(report)
    }

    async fn drive_locked(&self, run: RunId) -> RunReport {
        let deadline = Instant::now() + self.policy.budget();
        let mut state = RunState::new(run);
        state.enter(RunPhase::Idle);
        self.log_resume_point().await;
        let outcome = loop {
            if Instant::now() >= deadline {
                info!("run budget exhausted");
                break RunOutcome::BudgetExhausted;
            }
            let cycle = tokio::select! {
                end = self.run_cycle(&mut state) => end,
                () = sleep_until(deadline) => {
                    info!("run budget exhausted mid-cycle");
                    break RunOutcome::BudgetExhausted;
                }
            };
            match cycle {
                CycleEnd::Continue => {}
                CycleEnd::Completed => break RunOutcome::Completed,
                CycleEnd::Aborted(reason) => {
                    warn!(%reason, "run aborted");
                    break RunOutcome::Aborted { reason };
                }
            }
        };
        if matches!(outcome, RunOutcome::Completed) {
            if let Err(error) = self.coordination.clear_checkpoint().await {
                warn!(%error, "failed to clear the run checkpoint");
            }
            state.enter(RunPhase::Idle);
        } else {
            state.enter(RunPhase::Aborting);
        }
        RunReport::new(run, outcome, state.records, state.phases)
    }

    async fn log_resume_point(&self) {
        match self.coordination.load_checkpoint().await {
            Ok(Some(checkpoint)) => info!(
                resumed_from = checkpoint.last_completed().map_or("-", TaskId::as_str),
                tasks_completed = checkpoint.tasks_completed(),
                "resuming after an earlier run"
            ),
            Ok(None) => {}
            Err(error) => warn!(%error, "failed to load the run checkpoint"),
        }
    }

    async fn run_cycle(&self, state: &mut RunState) -> CycleEnd {
        state.enter(RunPhase::Analyzing);
        let ideas = match self.store.list_ideas(None).await {
            Ok(ideas) => ideas,
            Err(error) => return CycleEnd::Aborted(format!("board read failed: {error}")),
        };
        let views = StateAnalyzer::analyze_all(&ideas);

        state.enter(RunPhase::Selecting);
        let batch = self
            .selector
            .select_batch(&views, self.policy.worker_limit(), &state.failed);
        let Some(first) = batch.first() else {
            info!("no further work is selectable");
            return CycleEnd::Completed;
        };
        info!(count = batch.len(), kind = %first.kind(), "selected task batch");

        state.enter(RunPhase::Executing);
        let mut prepared = Vec::with_capacity(batch.len());
        for task in batch {
            let context = self.prepare_context(&task, &views).await;
            prepared.push((task, context));
        }
        let outcomes = self.executor.execute_batch(prepared).await;

        state.enter(RunPhase::Committing);
        let mut committed_any = false;
        for (task, outcome) in outcomes {
            match outcome {
                Ok(result) => match self.commit(result).await {
                    Ok(()) => {
                        info!(task = %task.id(), "task committed");
                        state.record_committed(&task);
                        committed_any = true;
                    }
                    Err(CommitError::Fatal(reason)) => return CycleEnd::Aborted(reason),
                    Err(CommitError::Rejected(reason) | CommitError::Throttled(reason)) => {
                        warn!(task = %task.id(), %reason, "task result was not committed");
                        state.record_failed(&task, reason);
                    }
                },
                Err(error) => self.record_task_error(state, &task, &error).await,
            }
        }

        state.enter(RunPhase::Checkpointing);
        if committed_any {
            let checkpoint = Checkpoint::new(
                state.run,
                state.last_committed.clone(),
                state.committed,
                self.clock.utc(),
            );
            if let Err(error) = self.coordination.save_checkpoint(&checkpoint).await {
                return CycleEnd::Aborted(format!("checkpoint save failed: {error}"));
            }
        }
        CycleEnd::Continue
    }

    async fn prepare_context(&self, task: &Task, views: &[ProjectState]) -> HandlerContext {
        let known: Vec<IdeaId> = views.iter().map(|view| view.id().clone()).collect();
        let mut context = HandlerContext::new(
            Arc::clone(&self.generator),
            self.policy.max_tokens(),
            self.clock.utc(),
        )
        .with_known_ideas(known);
        if let Some(view) = task
            .target()
            .and_then(|idea| views.iter().find(|candidate| candidate.id() == idea))
        {
            context = context.with_state(view.clone());
        }
        if let Some(material) = self.material_for(task).await {
            context = context.with_material(material);
        }
        context
    }

    /// Prefetches the artifact a handler reads, when its kind needs one.
    ///
    /// A missing or unreadable artifact is not fatal here; the handler
    /// reports the gap itself when the material matters.
    async fn material_for(&self, task: &Task) -> Option<String> {
        let idea = task.target()?;
        let kind = Self::material_kind(task)?;
        self.store
            .read_artifact(idea, kind)
            .await
            .map_err(|error| warn!(task = %task.id(), %error, "failed to prefetch task material"))
            .ok()
    }

    const fn material_kind(task: &Task) -> Option<ArtifactKind> {
        match task.kind() {
            TaskKind::WriteReview => task.review_target(),
            TaskKind::DraftImplementationPlan | TaskKind::GeneratePaper => {
                Some(ArtifactKind::DesignDoc)
            }
            TaskKind::Implement => Some(ArtifactKind::ImplementationPlan),
            TaskKind::ValidateReferences => Some(ArtifactKind::Paper),
            TaskKind::AdvanceStage | TaskKind::DraftDesign | TaskKind::BrainstormIdea => None,
        }
    }

    async fn record_task_error(&self, state: &mut RunState, task: &Task, error: &TaskError) {
        warn!(task = %task.id(), %error, "task failed");
        let reason = error.to_string();
        if error.marks_idea() {
            self.mark_failure_label(task, &reason).await;
        }
        state.record_failed(task, reason);
    }

    async fn mark_failure_label(&self, task: &Task, reason: &str) {
        let Some(idea) = task.target() else {
            return;
        };
        if let Err(error) = self
            .store
            .record_task_failure(idea, task.kind().slug(), reason)
            .await
        {
            warn!(idea = %idea, %error, "failed to record the task failure label");
        }
    }

    async fn commit(&self, result: TaskResult) -> Result<(), CommitError> {
        let (task, effect) = result.into_parts();
        match effect {
            TaskEffect::RegisterIdea { id, title, summary } => {
                self.register(id, &title, &summary).await
            }
            TaskEffect::CommitArtifact {
                kind,
                files,
                message,
            } => {
                let idea = Self::target_of(&task)?;
                self.conditional(idea, |fetched| {
                    let attempt_files = files.clone();
                    let note = message.as_str();
                    async move {
                        self.store
                            .commit_artifact(idea, &fetched.version, kind, attempt_files, note)
                            .await
                            .map(|_| ())
                    }
                })
                .await
            }
            TaskEffect::AppendReview { review } => {
                let idea = Self::target_of(&task)?;
                self.conditional(idea, |fetched| {
                    let entry = review.clone();
                    async move {
                        self.store
                            .append_review(idea, &fetched.version, &entry)
                            .await
                            .map(|_| ())
                    }
                })
                .await
            }
            TaskEffect::AdvanceStage { to, .. } => {
                let idea = Self::target_of(&task)?;
                let thresholds = self.selector.thresholds();
                self.conditional(idea, |fetched| async move {
                    let mut fresh = fetched.idea;
                    fresh.advance_stage(to, thresholds, self.clock.utc())?;
                    self.store
                        .save_idea(idea, &fetched.version, &fresh)
                        .await
                        .map(|_| ())
                })
                .await
            }
            TaskEffect::MarkValidated => {
                let idea = Self::target_of(&task)?;
                self.store
                    .mark_references_validated(idea)
                    .await
                    .map_err(|error| Self::classify_store_error(&error, 1))
            }
        }
    }

    async fn register(&self, id: IdeaId, title: &str, summary: &str) -> Result<(), CommitError> {
        let idea = Idea::new(id, title, self.clock.as_ref())
            .map_err(|error| CommitError::Rejected(error.to_string()))?;
        if let Err(error) = self.store.register_idea(&idea).await {
            return Err(Self::classify_store_error(&error, 1));
        }
        if let Err(error) = self.store.annotate(idea.id(), summary).await {
            warn!(idea = %idea.id(), %error, "failed to note the idea summary");
        }
        Ok(())
    }

    /// Applies a conditional write, re-reading the idea before each
    /// attempt so every retry carries a fresh version token.
    async fn conditional<F, Fut>(&self, idea: &IdeaId, mut write: F) -> Result<(), CommitError>
    where
        F: FnMut(VersionedIdea) -> Fut,
        Fut: Future<Output = Result<(), StoreError>>,
    {
        let mut attempts: u32 = 0;
        loop {
            let fetched = match self.store.get_idea(idea).await {
                Ok(fetched) => fetched,
                Err(error) => return Err(Self::classify_store_error(&error, attempts)),
            };
            attempts = attempts.saturating_add(1);
            match write(fetched).await {
                Ok(()) => return Ok(()),
                Err(StoreError::Conflict { .. }) if attempts < self.policy.commit_attempts() => {
                    debug!(idea = %idea, attempts, "conditional write conflicted, retrying");
                }
                Err(error) => return Err(Self::classify_store_error(&error, attempts)),
            }
        }
    }

    fn target_of(task: &Task) -> Result<&IdeaId, CommitError> {
        task.target().ok_or_else(|| {
            CommitError::Rejected(format!(
                "task {} produced a write with no target idea",
                task.id()
            ))
        })
    }

    fn classify_store_error(error: &StoreError, attempts: u32) -> CommitError {
        match error {
            StoreError::Conflict { idea } => CommitError::Fatal(format!(
                "write conflict for idea {idea} persisted after {attempts} attempts"
            )),
            StoreError::RateLimitExhausted { .. } => CommitError::Throttled(error.to_string()),
            StoreError::IdeaNotFound(_)
            | StoreError::DuplicateIdea(_)
            | StoreError::ArtifactMissing { .. }
            | StoreError::Domain(_) => CommitError::Rejected(error.to_string()),
            StoreError::AccessDenied { .. } | StoreError::Board(_) => {
                CommitError::Fatal(error.to_string())
            }
        }
    }
}

/// Mutable bookkeeping for one run in flight.
struct RunState {
    run: RunId,
    records: Vec<TaskRecord>,
    phases: Vec<RunPhase>,
    failed: BTreeSet<TaskId>,
    committed: u32,
    last_committed: Option<TaskId>,
}

impl RunState {
    const fn new(run: RunId) -> Self {
        Self {
            run,
            records: Vec::new(),
            phases: Vec::new(),
            failed: BTreeSet::new(),
            committed: 0,
            last_committed: None,
        }
    }

    fn enter(&mut self, phase: RunPhase) {
        debug!(phase = %phase, "entering run phase");
        self.phases.push(phase);
    }

    fn record_committed(&mut self, task: &Task) {
        self.records.push(TaskRecord::completed(task));
        self.committed = self.committed.saturating_add(1);
        self.last_committed = Some(task.id().clone());
    }

    fn record_failed(&mut self, task: &Task, reason: String) {
        self.failed.insert(task.id().clone());
        self.records.push(TaskRecord::failed(task, reason));
    }
}
