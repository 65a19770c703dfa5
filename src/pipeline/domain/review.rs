//! Reviews and the weighted points they contribute to stage gates.

use std::fmt;

use chrono::{DateTime, Utc};

use super::artifact::ArtifactKind;
use super::error::PipelineDomainError;
use super::points::Points;

/// Author of a review, determining the weight its points carry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAuthor {
    /// A language model acting as reviewer.
    Llm {
        /// Identifier of the reviewing model.
        model: String,
    },
    /// A human reviewer.
    Human {
        /// Login of the reviewer on the tracker.
        login: String,
    },
}

impl ReviewAuthor {
    /// Creates a model author.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyReviewAuthor`] when the model
    /// identifier is empty after trimming.
    pub fn llm(model: &str) -> Result<Self, PipelineDomainError> {
        let trimmed = model.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyReviewAuthor);
        }
        Ok(Self::Llm {
            model: trimmed.to_owned(),
        })
    }

    /// Creates a human author.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyReviewAuthor`] when the login
    /// is empty after trimming.
    pub fn human(login: &str) -> Result<Self, PipelineDomainError> {
        let trimmed = login.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyReviewAuthor);
        }
        Ok(Self::Human {
            login: trimmed.to_owned(),
        })
    }

    /// Returns the points a review by this author contributes when it
    /// qualifies: half a point for a model, a full point for a human.
    #[must_use]
    pub const fn weight(&self) -> Points {
        match self {
            Self::Llm { .. } => Points::from_half_points(1),
            Self::Human { .. } => Points::from_half_points(2),
        }
    }

    /// Returns the author kind as a storage string.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Llm { .. } => "llm",
            Self::Human { .. } => "human",
        }
    }

    /// Returns the author's name: the model identifier or the login.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Llm { model } => model,
            Self::Human { login } => login,
        }
    }

    /// Reports whether the author is human.
    #[must_use]
    pub const fn is_human(&self) -> bool {
        matches!(self, Self::Human { .. })
    }
}

impl fmt::Display for ReviewAuthor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

/// Grade assigned by a review, on a one-to-ten scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReviewGrade(u8);

impl ReviewGrade {
    /// Lowest accepted grade.
    pub const MIN: u8 = 1;
    /// Highest accepted grade.
    pub const MAX: u8 = 10;

    /// Creates a grade after range validation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::InvalidReviewGrade`] when the value
    /// falls outside `1..=10`.
    pub const fn new(value: u8) -> Result<Self, PipelineDomainError> {
        if value < Self::MIN || value > Self::MAX {
            return Err(PipelineDomainError::InvalidReviewGrade { actual: value });
        }
        Ok(Self(value))
    }

    /// Returns the grade value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ReviewGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A review of one artifact category of an idea.
///
/// Reviews are immutable once created; the board records them as files
/// under the reviews directory and folds their weight into the idea's
/// per-category score.
#[derive(Debug, Clone, PartialEq)]
pub struct Review {
    author: ReviewAuthor,
    grade: ReviewGrade,
    target: ArtifactKind,
    body: String,
    requests_clarification: bool,
    created_at: DateTime<Utc>,
}

impl Review {
    /// Creates a review.
    ///
    /// The creation instant is supplied by the caller because reviews
    /// carry the timestamp of the event that produced them.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyReviewBody`] when the body is
    /// empty after trimming.
    pub fn new(
        author: ReviewAuthor,
        grade: ReviewGrade,
        target: ArtifactKind,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PipelineDomainError> {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Err(PipelineDomainError::EmptyReviewBody);
        }
        Ok(Self {
            author,
            grade,
            target,
            body: trimmed.to_owned(),
            requests_clarification: false,
            created_at,
        })
    }

    /// Marks the review as requesting substantive clarification, which
    /// resets the idea's accumulated points when the board records it.
    #[must_use]
    pub const fn with_clarification_request(mut self) -> Self {
        self.requests_clarification = true;
        self
    }

    /// Returns the review author.
    #[must_use]
    pub const fn author(&self) -> &ReviewAuthor {
        &self.author
    }

    /// Returns the assigned grade.
    #[must_use]
    pub const fn grade(&self) -> ReviewGrade {
        self.grade
    }

    /// Returns the artifact category the review targets.
    #[must_use]
    pub const fn target(&self) -> ArtifactKind {
        self.target
    }

    /// Returns the review body.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Reports whether the review requests substantive clarification.
    #[must_use]
    pub const fn requests_clarification(&self) -> bool {
        self.requests_clarification
    }

    /// Returns when the review was created.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the points this review contributes by author weight alone,
    /// before any qualification policy is applied.
    #[must_use]
    pub const fn weight(&self) -> Points {
        self.author.weight()
    }

    /// Returns the conventional file name for this review inside the
    /// reviews directory: author, date, and grade, separated by double
    /// underscores.
    #[must_use]
    pub fn file_name(&self) -> String {
        let author: String = self
            .author
            .name()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let date = self.created_at.format("%Y-%m-%d");
        format!("{author}__{date}__{}.md", self.grade)
    }
}
