//! Domain model for the research pipeline.
//!
//! The pipeline domain models research ideas moving through the staged
//! board, the review points that gate stage entry, and the artifacts bound
//! to each idea, while keeping all infrastructure concerns outside of the
//! domain boundary.

mod artifact;
mod error;
mod idea;
mod ids;
pub mod labels;
mod points;
mod review;
mod stage;

pub use artifact::{ArtifactFile, ArtifactKind, ArtifactRef, ParseArtifactKindError, review_directory};
pub use error::PipelineDomainError;
pub use idea::{Idea, PersistedIdeaData};
pub use ids::{CommitId, IdeaId, MAX_IDEA_ID_LENGTH, RunId, VersionToken};
pub use points::Points;
pub use review::{Review, ReviewAuthor, ReviewGrade};
pub use stage::{ParseStageError, Stage, StageThresholds};
