//! Wire types for the hosted tracker API.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pipeline::domain::{
    ArtifactKind, ArtifactRef, CommitId, Idea, IdeaId, PersistedIdeaData, Points, Review, Stage,
    VersionToken,
};
use crate::pipeline::ports::board::{BoardError, BoardResult, VersionedIdea};

fn decode_err(reason: impl ToString) -> BoardError {
    BoardError::Decode {
        reason: reason.to_string(),
    }
}

/// Idea state as the tracker serialises it.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdeaDto {
    pub id: String,
    pub title: String,
    pub stage: String,
    pub scores: BTreeMap<String, f64>,
    pub labels: Vec<String>,
    pub artifacts: Vec<ArtifactRefDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bound artifact reference on the wire.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactRefDto {
    pub kind: String,
    pub location: String,
    pub commit: String,
    pub committed_at: DateTime<Utc>,
    pub last_reviewed_at: Option<DateTime<Utc>>,
}

/// Idea payload paired with its version token.
#[derive(Debug, Deserialize)]
pub struct IdeaEnvelopeDto {
    pub idea: IdeaDto,
    pub version: String,
}

/// Bare version token payload.
#[derive(Debug, Deserialize)]
pub struct VersionDto {
    pub version: String,
}

/// Conflict payload carried by 409 responses.
#[derive(Debug, Deserialize)]
pub struct ConflictDto {
    pub current_version: String,
}

/// Conditional whole-state idea update.
#[derive(Debug, Serialize)]
pub struct UpdateIdeaDto {
    pub idea: IdeaDto,
    pub expected_version: String,
}

/// Review payload on the wire.
#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub author_kind: &'static str,
    pub author_name: String,
    pub grade: u8,
    pub target: &'static str,
    pub body: String,
    pub requests_clarification: bool,
    pub created_at: DateTime<Utc>,
}

/// Conditional review append request.
#[derive(Debug, Serialize)]
pub struct AppendReviewDto {
    pub review: ReviewDto,
    pub weight: f64,
    pub expected_version: String,
}

/// Receipt returned after a review append.
#[derive(Debug, Deserialize)]
pub struct ReviewReceiptDto {
    pub total: f64,
    pub version: String,
    pub reset: bool,
}

/// Single file inside a commit request.
#[derive(Debug, Serialize)]
pub struct CommitFileDto {
    pub path: String,
    pub contents: String,
}

/// Conditional artifact commit request.
#[derive(Debug, Serialize)]
pub struct CommitDto {
    pub kind: &'static str,
    pub message: String,
    pub files: Vec<CommitFileDto>,
    pub committed_at: DateTime<Utc>,
    pub expected_version: String,
}

/// Receipt returned after an artifact commit.
#[derive(Debug, Deserialize)]
pub struct CommitReceiptDto {
    pub commit: String,
    pub location: String,
    pub version: String,
}

/// Free-form tracker note.
#[derive(Debug, Serialize)]
pub struct NoteDto {
    pub body: String,
}

impl IdeaDto {
    pub fn from_idea(idea: &Idea) -> Self {
        Self {
            id: idea.id().as_str().to_owned(),
            title: idea.title().to_owned(),
            stage: idea.stage().as_str().to_owned(),
            scores: idea
                .scores()
                .iter()
                .map(|(kind, points)| (kind.as_str().to_owned(), points.as_f64()))
                .collect(),
            labels: idea.labels().iter().cloned().collect(),
            artifacts: idea.artifacts().values().map(ArtifactRefDto::from_ref).collect(),
            created_at: idea.created_at(),
            updated_at: idea.updated_at(),
        }
    }

    pub fn into_idea(self) -> BoardResult<Idea> {
        let id = IdeaId::new(&self.id).map_err(decode_err)?;
        let stage = Stage::try_from(self.stage.as_str()).map_err(decode_err)?;
        let mut scores = BTreeMap::new();
        for (kind, value) in &self.scores {
            let parsed = ArtifactKind::try_from(kind.as_str()).map_err(decode_err)?;
            let points = Points::try_from_f64(*value).map_err(decode_err)?;
            scores.insert(parsed, points);
        }
        let mut artifacts = BTreeMap::new();
        for artifact in self.artifacts {
            let bound = artifact.into_ref()?;
            artifacts.insert(bound.kind(), bound);
        }
        let labels: BTreeSet<String> = self.labels.into_iter().collect();
        Ok(Idea::from_persisted(PersistedIdeaData {
            id,
            title: self.title,
            stage,
            scores,
            labels,
            artifacts,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

impl ArtifactRefDto {
    pub fn from_ref(artifact: &ArtifactRef) -> Self {
        Self {
            kind: artifact.kind().as_str().to_owned(),
            location: artifact.location().to_owned(),
            commit: artifact.commit().as_str().to_owned(),
            committed_at: artifact.committed_at(),
            last_reviewed_at: artifact.last_reviewed_at(),
        }
    }

    pub fn into_ref(self) -> BoardResult<ArtifactRef> {
        let kind = ArtifactKind::try_from(self.kind.as_str()).map_err(decode_err)?;
        Ok(ArtifactRef::from_parts(
            kind,
            self.location,
            CommitId::new(self.commit),
            self.committed_at,
            self.last_reviewed_at,
        ))
    }
}

impl IdeaEnvelopeDto {
    pub fn into_versioned(self) -> BoardResult<VersionedIdea> {
        Ok(VersionedIdea {
            idea: self.idea.into_idea()?,
            version: VersionToken::new(self.version),
        })
    }
}

impl ReviewDto {
    pub fn from_review(review: &Review) -> Self {
        Self {
            author_kind: review.author().kind(),
            author_name: review.author().name().to_owned(),
            grade: review.grade().value(),
            target: review.target().as_str(),
            body: review.body().to_owned(),
            requests_clarification: review.requests_clarification(),
            created_at: review.created_at(),
        }
    }
}
