//! Tracker label conventions shared by the board and the engine.
//!
//! Labels are the board's visible ledger: per-category point scores,
//! clarification state, reference validation state, and failure markers
//! all surface as labels on the idea's tracker issue.

use super::artifact::ArtifactKind;
use super::points::Points;

/// Label marking an idea that received a substantive clarification
/// request and awaits a refreshed design.
pub const NEEDS_CLARIFICATION: &str = "needs-clarification";

/// Label marking an idea whose paper references passed validation.
pub const REFERENCES_VALIDATED: &str = "references-validated";

const SCORE_PREFIX: &str = "score/";
const TASK_FAILURE_PREFIX: &str = "task-failed/";

/// Renders the score ledger label for one artifact category.
#[must_use]
pub fn score(kind: ArtifactKind, total: Points) -> String {
    format!("{SCORE_PREFIX}{}:{total}", kind.as_str())
}

/// Returns the prefix shared by all score labels of one category,
/// used to drop a stale score before recording a new one.
#[must_use]
pub fn score_prefix(kind: ArtifactKind) -> String {
    format!("{SCORE_PREFIX}{}:", kind.as_str())
}

/// Reports whether a label belongs to the score ledger.
#[must_use]
pub fn is_score(label: &str) -> bool {
    label.starts_with(SCORE_PREFIX)
}

/// Renders the failure marker label for a task kind slug.
///
/// The marker keeps the selector from re-issuing a task kind that already
/// failed for the idea until an operator clears the label.
#[must_use]
pub fn task_failure(kind_slug: &str) -> String {
    format!("{TASK_FAILURE_PREFIX}{kind_slug}")
}
