//! Priority-ordered task selection.

use std::collections::BTreeSet;

use crate::engine::domain::{ProjectState, Task, TaskId, TaskKind};
use crate::pipeline::domain::{ArtifactKind, Stage, StageThresholds};

/// Chooses the next tasks from a set of project states.
///
/// Selection walks a fixed priority order: stage advancement first,
/// then design, implementation plan, implementation, paper, reference
/// validation, and reviews. Brainstorming runs only when the backlog
/// is empty and nothing else is selectable. Within the winning tier
/// the batch is capped at one task unless the kind tolerates parallel
/// execution.
#[derive(Debug, Clone)]
pub struct TaskSelector {
    thresholds: StageThresholds,
}

impl TaskSelector {
    /// Creates a selector gating advancement on the given thresholds.
    #[must_use]
    pub const fn new(thresholds: StageThresholds) -> Self {
        Self { thresholds }
    }

    /// Returns the stage thresholds the selector advances against.
    #[must_use]
    pub const fn thresholds(&self) -> &StageThresholds {
        &self.thresholds
    }

    /// Chooses the single highest-priority task, if any.
    ///
    /// Tasks whose identifiers appear in `exclude` are skipped; the
    /// orchestrator passes the identifiers of tasks that already
    /// failed this run so selection cannot loop on them.
    #[must_use]
    pub fn select(&self, states: &[ProjectState], exclude: &BTreeSet<TaskId>) -> Option<Task> {
        self.select_batch(states, 1, exclude).into_iter().next()
    }

    /// Chooses a batch of tasks from the highest non-empty tier.
    ///
    /// All tasks in a batch share one kind. Kinds that mutate stage or
    /// bind prerequisite artifacts are returned singly regardless of
    /// `limit`; parallel-tolerant kinds fill the batch up to `limit`.
    #[must_use]
    pub fn select_batch(
        &self,
        states: &[ProjectState],
        limit: usize,
        exclude: &BTreeSet<TaskId>,
    ) -> Vec<Task> {
        let advancement = |state: &ProjectState| self.advancement(state);
        let tiers: [&dyn Fn(&ProjectState) -> Option<Task>; 7] = [
            &advancement,
            &Self::design,
            &Self::implementation_plan,
            &Self::implementation,
            &Self::paper,
            &Self::validation,
            &Self::review,
        ];
        for tier in tiers {
            let candidates: Vec<Task> = states
                .iter()
                .filter_map(tier)
                .filter(|task| !exclude.contains(task.id()))
                .collect();
            if let Some(first) = candidates.first() {
                let cap = if first.kind().is_parallelisable() {
                    limit.max(1)
                } else {
                    1
                };
                return candidates.into_iter().take(cap).collect();
            }
        }
        Self::brainstorm(states, exclude)
    }

    fn advancement(&self, state: &ProjectState) -> Option<Task> {
        if state.failed(TaskKind::AdvanceStage) {
            return None;
        }
        let to = state.pending_transition(&self.thresholds)?;
        Some(Task::advance(state.id().clone(), to))
    }

    fn design(state: &ProjectState) -> Option<Task> {
        let wanted = state.stage() == Stage::Backlog
            && (!state.has_artifact(ArtifactKind::DesignDoc) || state.needs_clarification())
            && !state.failed(TaskKind::DraftDesign);
        wanted.then(|| Task::for_idea(TaskKind::DraftDesign, state.id().clone()))
    }

    fn implementation_plan(state: &ProjectState) -> Option<Task> {
        let wanted = state.stage() == Stage::Ready
            && !state.has_artifact(ArtifactKind::ImplementationPlan)
            && !state.failed(TaskKind::DraftImplementationPlan);
        wanted.then(|| Task::for_idea(TaskKind::DraftImplementationPlan, state.id().clone()))
    }

    fn implementation(state: &ProjectState) -> Option<Task> {
        let wanted = state.stage() == Stage::InProgress
            && !state.has_artifact(ArtifactKind::Code)
            && !state.failed(TaskKind::Implement);
        wanted.then(|| Task::for_idea(TaskKind::Implement, state.id().clone()))
    }

    fn paper(state: &ProjectState) -> Option<Task> {
        let wanted = state.stage() == Stage::InProgress
            && state.has_artifact(ArtifactKind::Code)
            && !state.has_artifact(ArtifactKind::Paper)
            && !state.failed(TaskKind::GeneratePaper);
        wanted.then(|| Task::for_idea(TaskKind::GeneratePaper, state.id().clone()))
    }

    fn validation(state: &ProjectState) -> Option<Task> {
        let wanted = state.has_artifact(ArtifactKind::Paper)
            && !state.references_validated()
            && !state.stage().is_terminal()
            && !state.failed(TaskKind::ValidateReferences);
        wanted.then(|| Task::for_idea(TaskKind::ValidateReferences, state.id().clone()))
    }

    fn review(state: &ProjectState) -> Option<Task> {
        if state.stage().is_terminal() || state.failed(TaskKind::WriteReview) {
            return None;
        }
        let waiting = state.oldest_unreviewed()?;
        Some(Task::review(state.id().clone(), waiting.kind))
    }

    fn brainstorm(states: &[ProjectState], exclude: &BTreeSet<TaskId>) -> Vec<Task> {
        let backlog_occupied = states.iter().any(|state| state.stage() == Stage::Backlog);
        if backlog_occupied {
            return Vec::new();
        }
        let task = Task::brainstorm();
        if exclude.contains(task.id()) {
            return Vec::new();
        }
        vec![task]
    }
}
