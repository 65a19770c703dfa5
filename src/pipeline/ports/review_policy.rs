//! Qualification policy for human reviews.

use crate::pipeline::domain::Review;

/// Decides whether a human review is substantive enough to earn its full
/// point weight.
///
/// Model reviews always earn their weight; the policy is consulted for
/// human reviews only. A review that does not qualify is still recorded,
/// it just contributes zero points.
pub trait HumanReviewPolicy: Send + Sync {
    /// Reports whether the review earns its author's weight.
    fn qualifies(&self, review: &Review) -> bool;
}

/// Policy that accepts every human review as substantive.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAllHumanReviews;

impl HumanReviewPolicy for AcceptAllHumanReviews {
    fn qualifies(&self, _review: &Review) -> bool {
        true
    }
}

/// Policy that requires a minimum body length before a human review
/// counts towards the gate.
#[derive(Debug, Clone, Copy)]
pub struct SubstantiveBodyPolicy {
    min_chars: usize,
}

impl SubstantiveBodyPolicy {
    /// Creates a policy requiring at least `min_chars` characters of
    /// review body. A minimum of zero accepts everything.
    #[must_use]
    pub const fn new(min_chars: usize) -> Self {
        Self { min_chars }
    }

    /// Returns the configured minimum body length.
    #[must_use]
    pub const fn min_chars(&self) -> usize {
        self.min_chars
    }
}

impl HumanReviewPolicy for SubstantiveBodyPolicy {
    fn qualifies(&self, review: &Review) -> bool {
        review.body().chars().count() >= self.min_chars
    }
}
