//! The research idea aggregate.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use mockable::Clock;

use super::artifact::{ArtifactKind, ArtifactRef};
use super::error::PipelineDomainError;
use super::ids::IdeaId;
use super::labels;
use super::points::Points;
use super::review::Review;
use super::stage::{Stage, StageThresholds};

/// A research idea tracked on the staged board.
///
/// The aggregate owns the idea's stage, its per-category review scores,
/// its tracker labels, and the artifacts bound to it. State changes only
/// through recorded events: reviews, artifact commits, stage transitions,
/// and clarification resets.
#[derive(Debug, Clone, PartialEq)]
pub struct Idea {
    id: IdeaId,
    title: String,
    stage: Stage,
    scores: BTreeMap<ArtifactKind, Points>,
    labels: BTreeSet<String>,
    artifacts: BTreeMap<ArtifactKind, ArtifactRef>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Persisted idea state used to rehydrate the aggregate from a board
/// adapter.
#[derive(Debug, Clone)]
pub struct PersistedIdeaData {
    /// Idea identifier.
    pub id: IdeaId,
    /// Idea title.
    pub title: String,
    /// Current board stage.
    pub stage: Stage,
    /// Accumulated review points per artifact category.
    pub scores: BTreeMap<ArtifactKind, Points>,
    /// Tracker labels attached to the idea.
    pub labels: BTreeSet<String>,
    /// Artifacts bound to the idea.
    pub artifacts: BTreeMap<ArtifactKind, ArtifactRef>,
    /// When the idea was registered.
    pub created_at: DateTime<Utc>,
    /// When the idea last changed.
    pub updated_at: DateTime<Utc>,
}

impl Idea {
    /// Creates a freshly registered idea in the backlog.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyIdeaTitle`] when the title is
    /// empty after trimming.
    pub fn new(id: IdeaId, title: &str, clock: &impl Clock) -> Result<Self, PipelineDomainError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyIdeaTitle);
        }
        let now = clock.utc();
        Ok(Self {
            id,
            title: trimmed.to_owned(),
            stage: Stage::Backlog,
            scores: BTreeMap::new(),
            labels: BTreeSet::new(),
            artifacts: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Rehydrates an idea from persisted state without validation.
    #[must_use]
    pub fn from_persisted(data: PersistedIdeaData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            stage: data.stage,
            scores: data.scores,
            labels: data.labels,
            artifacts: data.artifacts,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the idea identifier.
    #[must_use]
    pub const fn id(&self) -> &IdeaId {
        &self.id
    }

    /// Returns the idea title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the current board stage.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the accumulated points for one artifact category.
    #[must_use]
    pub fn points(&self, kind: ArtifactKind) -> Points {
        self.scores.get(&kind).copied().unwrap_or(Points::ZERO)
    }

    /// Returns all per-category scores.
    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<ArtifactKind, Points> {
        &self.scores
    }

    /// Returns the tracker labels attached to the idea.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Reports whether the given label is attached.
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// Returns all bound artifacts.
    #[must_use]
    pub const fn artifacts(&self) -> &BTreeMap<ArtifactKind, ArtifactRef> {
        &self.artifacts
    }

    /// Returns the bound artifact of one category, if any.
    #[must_use]
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&ArtifactRef> {
        self.artifacts.get(&kind)
    }

    /// Reports whether an artifact of the given category is bound.
    #[must_use]
    pub fn has_artifact(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains_key(&kind)
    }

    /// Returns when the idea was registered.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the idea last changed.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Records a review against its target category and returns the new
    /// total for that category.
    ///
    /// The caller supplies the weight the review actually earns, which is
    /// zero when a qualification policy discounts it. A review requesting
    /// substantive clarification contributes nothing and instead resets
    /// the idea; see [`Idea::reset_for_clarification`].
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::IdeaAlreadyDone`] when a
    /// clarification request targets a finished idea.
    pub fn record_review(
        &mut self,
        review: &Review,
        weight: Points,
    ) -> Result<Points, PipelineDomainError> {
        let at = review.created_at();
        if let Some(artifact) = self.artifacts.get_mut(&review.target()) {
            artifact.mark_reviewed(at);
        }
        if review.requests_clarification() {
            self.reset_for_clarification(at)?;
            return Ok(Points::ZERO);
        }
        let total = self.points(review.target()).saturating_add(weight);
        self.scores.insert(review.target(), total);
        self.write_score_label(review.target(), total);
        self.touch(at);
        Ok(total)
    }

    /// Resets all accumulated points to zero, moves the idea one stage
    /// backward where possible, and flags it as needing clarification.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::IdeaAlreadyDone`] when the idea has
    /// reached the terminal stage.
    pub fn reset_for_clarification(&mut self, at: DateTime<Utc>) -> Result<(), PipelineDomainError> {
        if self.stage.is_terminal() {
            return Err(PipelineDomainError::IdeaAlreadyDone {
                idea: self.id.clone(),
            });
        }
        self.scores.clear();
        self.labels.retain(|label| !labels::is_score(label));
        if let Some(previous) = self.stage.predecessor() {
            self.stage = previous;
        }
        self.labels.insert(labels::NEEDS_CLARIFICATION.to_owned());
        self.touch(at);
        Ok(())
    }

    /// Binds a freshly committed artifact, replacing any previous binding
    /// of the same category.
    ///
    /// A rebind makes the content unreviewed again, and any pending
    /// clarification flag is cleared because new content answers it.
    pub fn bind_artifact(&mut self, artifact: ArtifactRef) {
        let at = artifact.committed_at();
        self.labels.remove(labels::NEEDS_CLARIFICATION);
        self.artifacts.insert(artifact.kind(), artifact);
        self.touch(at);
    }

    /// Advances the idea to the next stage after checking every gate.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::StageNotAdjacent`] when the target
    /// is not the immediate successor, [`PipelineDomainError::GateNotMet`]
    /// when the entry gate's accumulated points fall short of the
    /// threshold, and [`PipelineDomainError::PaperMissing`] when entry
    /// into the terminal stage lacks a bound paper.
    pub fn advance_stage(
        &mut self,
        to: Stage,
        thresholds: &StageThresholds,
        at: DateTime<Utc>,
    ) -> Result<(), PipelineDomainError> {
        if self.stage.successor() != Some(to) {
            return Err(PipelineDomainError::StageNotAdjacent {
                idea: self.id.clone(),
                from: self.stage,
                to,
            });
        }
        if let Some(gate) = to.entry_gate() {
            let need = thresholds.entry_requirement(to).unwrap_or(Points::ZERO);
            let have = self.points(gate);
            if !have.meets(need) {
                return Err(PipelineDomainError::GateNotMet {
                    idea: self.id.clone(),
                    gate,
                    to,
                    have,
                    need,
                });
            }
        }
        if to.is_terminal() && !self.has_artifact(ArtifactKind::Paper) {
            return Err(PipelineDomainError::PaperMissing {
                idea: self.id.clone(),
            });
        }
        self.stage = to;
        self.touch(at);
        Ok(())
    }

    /// Attaches a tracker label.
    pub fn add_label(&mut self, label: &str, at: DateTime<Utc>) {
        self.labels.insert(label.to_owned());
        self.touch(at);
    }

    /// Detaches a tracker label, reporting whether it was present.
    pub fn remove_label(&mut self, label: &str, at: DateTime<Utc>) -> bool {
        let removed = self.labels.remove(label);
        if removed {
            self.touch(at);
        }
        removed
    }

    fn write_score_label(&mut self, kind: ArtifactKind, total: Points) {
        let prefix = labels::score_prefix(kind);
        self.labels.retain(|label| !label.starts_with(&prefix));
        self.labels.insert(labels::score(kind, total));
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}
