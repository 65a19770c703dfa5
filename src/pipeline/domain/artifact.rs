//! Artifact categories and the repository layout conventions behind them.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use super::error::PipelineDomainError;
use super::ids::{CommitId, IdeaId};

/// Category of artifact bound to a research idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    /// Technical design document describing the research approach.
    DesignDoc,
    /// Implementation plan derived from an approved design.
    ImplementationPlan,
    /// Experiment code produced during implementation.
    Code,
    /// The research paper reporting results.
    Paper,
    /// A review of another artifact.
    Review,
}

impl ArtifactKind {
    /// Artifact categories that reviews may target, in board order.
    pub const REVIEWABLE: [Self; 4] = [
        Self::DesignDoc,
        Self::ImplementationPlan,
        Self::Code,
        Self::Paper,
    ];

    /// Returns the canonical storage form of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DesignDoc => "design_doc",
            Self::ImplementationPlan => "implementation_plan",
            Self::Code => "code",
            Self::Paper => "paper",
            Self::Review => "review",
        }
    }

    /// Returns a human-readable name for commit messages and notes.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::DesignDoc => "design document",
            Self::ImplementationPlan => "implementation plan",
            Self::Code => "experiment code",
            Self::Paper => "paper",
            Self::Review => "review",
        }
    }

    /// Returns the repository directory holding this artifact for the
    /// given idea, with a trailing slash.
    ///
    /// Review files live one level deeper, under a subdirectory per
    /// reviewed category; see [`review_directory`].
    #[must_use]
    pub fn directory(self, idea: &IdeaId) -> String {
        let root = match self {
            Self::DesignDoc => "technical_design_documents",
            Self::ImplementationPlan => "implementation_plans",
            Self::Code => "code",
            Self::Paper => "papers",
            Self::Review => "reviews",
        };
        format!("{root}/{idea}/")
    }

    /// Returns the file name conventionally committed for this category,
    /// or `None` for reviews, which are named after their author and date.
    #[must_use]
    pub const fn primary_file_name(self) -> Option<&'static str> {
        match self {
            Self::DesignDoc => Some("design.md"),
            Self::ImplementationPlan => Some("plan.md"),
            Self::Code => Some("experiment.py"),
            Self::Paper => Some("paper.md"),
            Self::Review => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an artifact category string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown artifact kind: {0:?}")]
pub struct ParseArtifactKindError(String);

impl TryFrom<&str> for ArtifactKind {
    type Error = ParseArtifactKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "design_doc" => Ok(Self::DesignDoc),
            "implementation_plan" => Ok(Self::ImplementationPlan),
            "code" => Ok(Self::Code),
            "paper" => Ok(Self::Paper),
            "review" => Ok(Self::Review),
            other => Err(ParseArtifactKindError(other.to_owned())),
        }
    }
}

/// Returns the repository directory holding reviews of the given
/// category for the given idea, with a trailing slash.
#[must_use]
pub fn review_directory(idea: &IdeaId, target: ArtifactKind) -> String {
    format!("reviews/{idea}/{}/", target.as_str())
}

/// Reference to an artifact committed into the research repository and
/// bound to an idea.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    kind: ArtifactKind,
    location: String,
    commit: CommitId,
    committed_at: DateTime<Utc>,
    last_reviewed_at: Option<DateTime<Utc>>,
}

impl ArtifactRef {
    /// Creates a reference to a freshly committed, not yet reviewed
    /// artifact.
    #[must_use]
    pub const fn new(
        kind: ArtifactKind,
        location: String,
        commit: CommitId,
        committed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            location,
            commit,
            committed_at,
            last_reviewed_at: None,
        }
    }

    /// Restores a reference from persisted state, including any recorded
    /// review timestamp.
    #[must_use]
    pub const fn from_parts(
        kind: ArtifactKind,
        location: String,
        commit: CommitId,
        committed_at: DateTime<Utc>,
        last_reviewed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            kind,
            location,
            commit,
            committed_at,
            last_reviewed_at,
        }
    }

    /// Returns the artifact category.
    #[must_use]
    pub const fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Returns the repository location the artifact was committed to.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Returns the commit that bound this artifact.
    #[must_use]
    pub const fn commit(&self) -> &CommitId {
        &self.commit
    }

    /// Returns when the artifact was committed.
    #[must_use]
    pub const fn committed_at(&self) -> DateTime<Utc> {
        self.committed_at
    }

    /// Returns when the artifact was last reviewed, if ever.
    #[must_use]
    pub const fn last_reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.last_reviewed_at
    }

    /// Reports whether the committed content still awaits review.
    #[must_use]
    pub const fn is_unreviewed(&self) -> bool {
        self.last_reviewed_at.is_none()
    }

    /// Records that the artifact was reviewed at the given instant.
    pub fn mark_reviewed(&mut self, at: DateTime<Utc>) {
        self.last_reviewed_at = Some(at);
    }
}

/// A single file carried by an artifact commit.
///
/// Paths are relative to the artifact's conventional directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    path: String,
    contents: String,
}

impl ArtifactFile {
    /// Creates an artifact file after validating its relative path.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyArtifactPath`] when the trimmed
    /// path is empty, and [`PipelineDomainError::InvalidArtifactPath`] when
    /// the path is absolute or traverses upwards.
    pub fn new(path: &str, contents: String) -> Result<Self, PipelineDomainError> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyArtifactPath);
        }
        let escapes = trimmed.starts_with('/')
            || trimmed.contains('\\')
            || trimmed.split('/').any(|segment| segment == "..");
        if escapes {
            return Err(PipelineDomainError::InvalidArtifactPath {
                actual: trimmed.to_owned(),
            });
        }
        Ok(Self {
            path: trimmed.to_owned(),
            contents,
        })
    }

    /// Returns the path relative to the artifact directory.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the file contents.
    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }
}
