//! Derived scheduling view of one idea.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

use crate::pipeline::domain::{
    ArtifactKind, IdeaId, Points, Stage, StageThresholds, VersionToken, labels,
};

use super::task::TaskKind;

/// One bound artifact that has not been reviewed since its last commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnreviewedArtifact {
    /// Artifact category awaiting review.
    pub kind: ArtifactKind,
    /// When the artifact was last committed.
    pub committed_at: DateTime<Utc>,
}

/// Read-only scheduling view of one idea.
///
/// The analyzer derives a project state from each board read; the
/// selector consults only these views when choosing work, never the
/// board itself. The version token rides along so whichever task is
/// chosen can write back conditionally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectState {
    id: IdeaId,
    title: String,
    stage: Stage,
    scores: BTreeMap<ArtifactKind, Points>,
    labels: BTreeSet<String>,
    artifacts: BTreeSet<ArtifactKind>,
    unreviewed: Vec<UnreviewedArtifact>,
    version: VersionToken,
}

impl ProjectState {
    /// Creates a state with no scores, labels, or artifacts.
    #[must_use]
    pub const fn new(id: IdeaId, title: String, stage: Stage, version: VersionToken) -> Self {
        Self {
            id,
            title,
            stage,
            scores: BTreeMap::new(),
            labels: BTreeSet::new(),
            artifacts: BTreeSet::new(),
            unreviewed: Vec::new(),
            version,
        }
    }

    /// Sets the accumulated points of one artifact category.
    #[must_use]
    pub fn with_score(mut self, kind: ArtifactKind, points: Points) -> Self {
        self.scores.insert(kind, points);
        self
    }

    /// Attaches a tracker label.
    #[must_use]
    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.insert(label.to_owned());
        self
    }

    /// Records a bound artifact category.
    #[must_use]
    pub fn with_artifact(mut self, kind: ArtifactKind) -> Self {
        self.artifacts.insert(kind);
        self
    }

    /// Records an artifact awaiting review, keeping the list ordered
    /// oldest first.
    #[must_use]
    pub fn with_unreviewed(mut self, kind: ArtifactKind, committed_at: DateTime<Utc>) -> Self {
        self.unreviewed.push(UnreviewedArtifact { kind, committed_at });
        self.unreviewed.sort_by_key(|entry| entry.committed_at);
        self
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

    /// Returns the stage the idea currently occupies.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Returns the version token observed when the state was derived.
    #[must_use]
    pub const fn version(&self) -> &VersionToken {
        &self.version
    }

    /// Returns the accumulated points of one artifact category.
    #[must_use]
    pub fn score(&self, kind: ArtifactKind) -> Points {
        self.scores.get(&kind).copied().unwrap_or(Points::ZERO)
    }

    /// Reports whether an artifact of the given category is bound.
    #[must_use]
    pub fn has_artifact(&self, kind: ArtifactKind) -> bool {
        self.artifacts.contains(&kind)
    }

    /// Reports whether a task of the given kind has previously failed
    /// for this idea.
    #[must_use]
    pub fn failed(&self, kind: TaskKind) -> bool {
        self.labels.contains(&labels::task_failure(kind.slug()))
    }

    /// Reports whether a reviewer has requested clarification.
    #[must_use]
    pub fn needs_clarification(&self) -> bool {
        self.labels.contains(labels::NEEDS_CLARIFICATION)
    }

    /// Reports whether the paper's references passed validation.
    #[must_use]
    pub fn references_validated(&self) -> bool {
        self.labels.contains(labels::REFERENCES_VALIDATED)
    }

    /// Returns the artifact that has waited longest for a review.
    #[must_use]
    pub fn oldest_unreviewed(&self) -> Option<&UnreviewedArtifact> {
        self.unreviewed.first()
    }

    /// Returns the stage the idea is ready to enter, if any.
    ///
    /// A transition is pending when the immediate successor's review
    /// gate is satisfied. Entry into the terminal stage additionally
    /// requires a bound paper whose references have been validated.
    #[must_use]
    pub fn pending_transition(&self, thresholds: &StageThresholds) -> Option<Stage> {
        let next = self.stage.successor()?;
        if let Some(gate) = next.entry_gate() {
            let need = thresholds.entry_requirement(next).unwrap_or(Points::ZERO);
            if !self.score(gate).meets(need) {
                return None;
            }
        }
        if next.is_terminal()
            && !(self.has_artifact(ArtifactKind::Paper) && self.references_validated())
        {
            return None;
        }
        Some(next)
    }
}
