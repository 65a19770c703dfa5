//! Derives scheduling views from board reads.

use crate::engine::domain::ProjectState;
use crate::pipeline::ports::board::VersionedIdea;

/// Derives [`ProjectState`] views from raw board reads.
///
/// Analysis is pure: the same board read always yields the same views,
/// in the same order, which keeps task selection deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct StateAnalyzer;

impl StateAnalyzer {
    /// Derives the scheduling view of one idea.
    #[must_use]
    pub fn analyze(versioned: &VersionedIdea) -> ProjectState {
        let idea = &versioned.idea;
        let mut state = ProjectState::new(
            idea.id().clone(),
            idea.title().to_owned(),
            idea.stage(),
            versioned.version.clone(),
        );
        for (kind, points) in idea.scores() {
            state = state.with_score(*kind, *points);
        }
        for label in idea.labels() {
            state = state.with_label(label);
        }
        for (kind, artifact) in idea.artifacts() {
            state = state.with_artifact(*kind);
            if artifact.is_unreviewed() {
                state = state.with_unreviewed(*kind, artifact.committed_at());
            }
        }
        state
    }

    /// Derives views for a whole board read, ordered by idea identifier.
    #[must_use]
    pub fn analyze_all(ideas: &[VersionedIdea]) -> Vec<ProjectState> {
        let mut states: Vec<ProjectState> = ideas.iter().map(Self::analyze).collect();
        states.sort_by(|a, b| a.id().cmp(b.id()));
        states
    }
}
