//! Port contracts for the research pipeline.
//!
//! Ports define infrastructure-agnostic interfaces used by pipeline
//! services to reach the tracker board and to qualify human reviews.

pub mod board;
pub mod review_policy;

pub use board::{
    BoardError, BoardRepository, BoardResult, CommitReceipt, CommitRequest, ReviewReceipt,
    VersionedIdea,
};
pub use review_policy::{AcceptAllHumanReviews, HumanReviewPolicy, SubstantiveBodyPolicy};
