//! Task categories and task identity for the scheduling engine.

use std::fmt;

use crate::pipeline::domain::{ArtifactKind, IdeaId, Stage};

/// Closed set of work categories the engine can schedule.
///
/// The order of declaration mirrors the selection priority: stage
/// advancement first, then drafting and implementation work along the
/// pipeline, then reviews, with brainstorming as the fallback when the
/// backlog has run dry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskKind {
    /// Move an idea one stage forward once its gate is satisfied.
    AdvanceStage,
    /// Produce or rework the technical design document for an idea.
    DraftDesign,
    /// Produce the implementation plan for an idea entering Ready.
    DraftImplementationPlan,
    /// Produce the experiment code for an idea in progress.
    Implement,
    /// Produce the research paper for an idea in progress.
    GeneratePaper,
    /// Check the citations of a generated paper for well-formed sources.
    ValidateReferences,
    /// Review the oldest unreviewed artifact bound to an idea.
    WriteReview,
    /// Invent a new idea when the backlog is empty.
    BrainstormIdea,
}

impl TaskKind {
    /// Stable kebab-case name used in task identifiers and labels.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::AdvanceStage => "advance-stage",
            Self::DraftDesign => "draft-design",
            Self::DraftImplementationPlan => "draft-implementation-plan",
            Self::Implement => "implement",
            Self::GeneratePaper => "generate-paper",
            Self::ValidateReferences => "validate-references",
            Self::WriteReview => "write-review",
            Self::BrainstormIdea => "brainstorm-idea",
        }
    }

    /// Selection tier, lower numbers win.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::AdvanceStage => 1,
            Self::DraftDesign => 2,
            Self::DraftImplementationPlan => 3,
            Self::Implement => 4,
            Self::GeneratePaper => 5,
            Self::ValidateReferences => 6,
            Self::WriteReview => 7,
            Self::BrainstormIdea => 8,
        }
    }

    /// Whether tasks of this kind may run concurrently across distinct
    /// ideas.
    ///
    /// Review and design drafting touch one idea each and commute with
    /// each other, so the executor may batch them up to the worker
    /// limit. Everything else runs alone.
    #[must_use]
    pub const fn is_parallelisable(self) -> bool {
        matches!(self, Self::WriteReview | Self::DraftDesign)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Deterministic identifier for a scheduled task.
///
/// Identifiers are derived from the task kind and its target, so the
/// same project state always yields the same identifiers. A resumed run
/// can therefore recognise work it already completed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a task identifier read back from persistence.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of schedulable work.
///
/// A task names what to do and which idea it applies to; it carries no
/// behaviour. Handlers interpret tasks and produce effects, and the
/// orchestrator applies those effects to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    kind: TaskKind,
    target: Option<IdeaId>,
    review_target: Option<ArtifactKind>,
    to_stage: Option<Stage>,
}

impl Task {
    /// Creates a task of the given kind addressed to one idea.
    #[must_use]
    pub fn for_idea(kind: TaskKind, target: IdeaId) -> Self {
        let id = TaskId::new(format!("{}/{target}", kind.slug()));
        Self {
            id,
            kind,
            target: Some(target),
            review_target: None,
            to_stage: None,
        }
    }

    /// Creates the backlog-replenishment task, which has no target.
    #[must_use]
    pub fn brainstorm() -> Self {
        Self {
            id: TaskId::new(TaskKind::BrainstormIdea.slug().to_owned()),
            kind: TaskKind::BrainstormIdea,
            target: None,
            review_target: None,
            to_stage: None,
        }
    }

    /// Creates a review task for one artifact bound to an idea.
    #[must_use]
    pub fn review(target: IdeaId, artifact: ArtifactKind) -> Self {
        let id = TaskId::new(format!(
            "{}/{target}/{}",
            TaskKind::WriteReview.slug(),
            artifact.as_str()
        ));
        Self {
            id,
            kind: TaskKind::WriteReview,
            target: Some(target),
            review_target: Some(artifact),
            to_stage: None,
        }
    }

    /// Creates a stage-advancement task moving an idea into `to`.
    #[must_use]
    pub fn advance(target: IdeaId, to: Stage) -> Self {
        let id = TaskId::new(format!(
            "{}/{target}/{}",
            TaskKind::AdvanceStage.slug(),
            to.as_str()
        ));
        Self {
            id,
            kind: TaskKind::AdvanceStage,
            target: Some(target),
            review_target: None,
            to_stage: Some(to),
        }
    }

    /// Returns the deterministic task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task kind.
    #[must_use]
    pub const fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Returns the idea the task is addressed to, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&IdeaId> {
        self.target.as_ref()
    }

    /// Returns the artifact a review task is aimed at.
    #[must_use]
    pub const fn review_target(&self) -> Option<ArtifactKind> {
        self.review_target
    }

    /// Returns the destination stage of an advancement task.
    #[must_use]
    pub const fn to_stage(&self) -> Option<Stage> {
        self.to_stage
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id.as_str())
    }
}
