//! Run lifecycle types: phases, locks, checkpoints, and reports.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::pipeline::domain::RunId;

use super::task::{Task, TaskId, TaskKind};

/// Phase of the engine's run loop.
///
/// A run cycles Idle through Checkpointing and back; Aborting is
/// reachable from every phase when the budget expires or a fatal error
/// strikes. The orchestrator records each phase it enters so a report
/// shows the path a run took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No run in progress.
    Idle,
    /// Reading the board and deriving project states.
    Analyzing,
    /// Choosing the next task batch.
    Selecting,
    /// Executing handlers.
    Executing,
    /// Applying task effects to the board.
    Committing,
    /// Persisting the resume checkpoint.
    Checkpointing,
    /// Winding down after a fatal condition or budget expiry.
    Aborting,
}

impl RunPhase {
    /// Stable lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Analyzing => "analyzing",
            Self::Selecting => "selecting",
            Self::Executing => "executing",
            Self::Committing => "committing",
            Self::Checkpointing => "checkpointing",
            Self::Aborting => "aborting",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resume marker persisted after each committed cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    run: RunId,
    last_completed: Option<TaskId>,
    tasks_completed: u32,
    updated_at: DateTime<Utc>,
}

impl Checkpoint {
    /// Creates a checkpoint for the given run.
    #[must_use]
    pub const fn new(
        run: RunId,
        last_completed: Option<TaskId>,
        tasks_completed: u32,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run,
            last_completed,
            tasks_completed,
            updated_at,
        }
    }

    /// Returns the run that wrote the checkpoint.
    #[must_use]
    pub const fn run(&self) -> RunId {
        self.run
    }

    /// Returns the identifier of the most recently committed task.
    #[must_use]
    pub const fn last_completed(&self) -> Option<&TaskId> {
        self.last_completed.as_ref()
    }

    /// Returns how many tasks the writing run had committed.
    #[must_use]
    pub const fn tasks_completed(&self) -> u32 {
        self.tasks_completed
    }

    /// Returns when the checkpoint was written.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// Advisory lock guaranteeing a single active run.
///
/// Locks expire after their time-to-live so a crashed run cannot wedge
/// the engine forever; a holder string identifies the run for the
/// benefit of whoever finds the lock taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLock {
    holder: String,
    acquired_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl RunLock {
    /// Creates a lock held from `now` for the given time-to-live.
    #[must_use]
    pub fn new(holder: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            holder: holder.to_owned(),
            acquired_at: now,
            expires_at,
        }
    }

    /// Reconstructs a lock from persisted fields.
    #[must_use]
    pub const fn from_parts(
        holder: String,
        acquired_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            holder,
            acquired_at,
            expires_at,
        }
    }

    /// Returns the identity of the run holding the lock.
    #[must_use]
    pub fn holder(&self) -> &str {
        &self.holder
    }

    /// Returns when the lock was taken.
    #[must_use]
    pub const fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    /// Returns when the lock lapses.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Reports whether the lock has lapsed at the given instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Terminal condition of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No further work was selectable.
    Completed,
    /// The wall-clock budget expired before the work ran out.
    BudgetExhausted,
    /// Another run already held the lock; nothing was done.
    LockHeld {
        /// Identity of the run holding the lock.
        holder: String,
    },
    /// A fatal condition forced the run to wind down.
    Aborted {
        /// Human-readable description of the condition.
        reason: String,
    },
}

/// How one scheduled task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDisposition {
    /// The task's effect was committed to the board.
    Completed,
    /// The task failed; the run carried on without it.
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

/// Ledger entry for one task a run attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    task: TaskId,
    kind: TaskKind,
    disposition: TaskDisposition,
}

impl TaskRecord {
    /// Records a task whose effect was committed.
    #[must_use]
    pub fn completed(task: &Task) -> Self {
        Self {
            task: task.id().clone(),
            kind: task.kind(),
            disposition: TaskDisposition::Completed,
        }
    }

    /// Records a task that failed.
    #[must_use]
    pub fn failed(task: &Task, reason: String) -> Self {
        Self {
            task: task.id().clone(),
            kind: task.kind(),
            disposition: TaskDisposition::Failed { reason },
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn task(&self) -> &TaskId {
        &self.task
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns how the task ended.
    #[must_use]
    pub const fn disposition(&self) -> &TaskDisposition {
        &self.disposition
    }
}

/// Summary of one run: outcome, task ledger, and phase trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    run: RunId,
    outcome: RunOutcome,
    tasks: Vec<TaskRecord>,
    phases: Vec<RunPhase>,
}

impl RunReport {
    /// Assembles a report from a finished run.
    #[must_use]
    pub const fn new(
        run: RunId,
        outcome: RunOutcome,
        tasks: Vec<TaskRecord>,
        phases: Vec<RunPhase>,
    ) -> Self {
        Self {
            run,
            outcome,
            tasks,
            phases,
        }
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run(&self) -> RunId {
        self.run
    }

    /// Returns the terminal condition.
    #[must_use]
    pub const fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    /// Returns the task ledger in attempt order.
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Returns every phase the run entered, in order.
    #[must_use]
    pub fn phases(&self) -> &[RunPhase] {
        &self.phases
    }

    /// Counts the tasks whose effects were committed.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|record| matches!(record.disposition(), TaskDisposition::Completed))
            .count()
    }

    /// Counts the tasks that failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|record| matches!(record.disposition(), TaskDisposition::Failed { .. }))
            .count()
    }
}

/// Tunable limits governing one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPolicy {
    budget: Duration,
    worker_limit: usize,
    commit_attempts: u32,
    lock_ttl: Duration,
    max_tokens: u32,
}

impl RunPolicy {
    /// Default wall-clock budget for one run.
    pub const DEFAULT_BUDGET: Duration = Duration::from_secs(900);
    /// Default cap on concurrently executing tasks.
    pub const DEFAULT_WORKER_LIMIT: usize = 2;
    /// Default number of commit attempts per task under version
    /// conflicts.
    pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 3;
    /// Default run-lock time-to-live.
    pub const DEFAULT_LOCK_TTL: Duration = Duration::from_secs(1800);
    /// Default token cap for one generation call.
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;

    /// Overrides the wall-clock budget.
    #[must_use]
    pub const fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Overrides the concurrent worker cap.
    #[must_use]
    pub const fn with_worker_limit(mut self, limit: usize) -> Self {
        self.worker_limit = limit;
        self
    }

    /// Overrides the per-task commit attempt budget.
    #[must_use]
    pub const fn with_commit_attempts(mut self, attempts: u32) -> Self {
        self.commit_attempts = attempts;
        self
    }

    /// Overrides the run-lock time-to-live.
    #[must_use]
    pub const fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    /// Overrides the generation token cap.
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Returns the wall-clock budget.
    #[must_use]
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Returns the concurrent worker cap.
    #[must_use]
    pub const fn worker_limit(&self) -> usize {
        self.worker_limit
    }

    /// Returns the per-task commit attempt budget.
    #[must_use]
    pub const fn commit_attempts(&self) -> u32 {
        self.commit_attempts
    }

    /// Returns the run-lock time-to-live.
    #[must_use]
    pub const fn lock_ttl(&self) -> Duration {
        self.lock_ttl
    }

    /// Returns the generation token cap.
    #[must_use]
    pub const fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

impl Default for RunPolicy {
    fn default() -> Self {
        Self {
            budget: Self::DEFAULT_BUDGET,
            worker_limit: Self::DEFAULT_WORKER_LIMIT,
            commit_attempts: Self::DEFAULT_COMMIT_ATTEMPTS,
            lock_ttl: Self::DEFAULT_LOCK_TTL,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}
