//! Board stages and the review gates between them.

use std::fmt;

use thiserror::Error;

use super::artifact::ArtifactKind;
use super::points::Points;

/// Stage of a research idea on the tracker board.
///
/// Ideas progress strictly one stage at a time: `Backlog` to `Ready` to
/// `InProgress` to `Done`. Entry into `Ready` and `InProgress` is gated by
/// accumulated review points; entry into `Done` requires a bound paper
/// artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Idea captured but not yet designed.
    Backlog,
    /// Design approved by review; implementation may be planned.
    Ready,
    /// Implementation plan approved; experiments are underway.
    InProgress,
    /// Paper produced; the idea is complete.
    Done,
}

impl Stage {
    /// All stages in board order.
    pub const ORDERED: [Self; 4] = [Self::Backlog, Self::Ready, Self::InProgress, Self::Done];

    /// Returns the canonical storage form of the stage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Ready => "ready",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Returns the human-facing board column name.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Ready => "Ready",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Returns the next stage in board order, if any.
    #[must_use]
    pub const fn successor(self) -> Option<Self> {
        match self {
            Self::Backlog => Some(Self::Ready),
            Self::Ready => Some(Self::InProgress),
            Self::InProgress => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Returns the previous stage in board order, if any.
    #[must_use]
    pub const fn predecessor(self) -> Option<Self> {
        match self {
            Self::Backlog => None,
            Self::Ready => Some(Self::Backlog),
            Self::InProgress => Some(Self::Ready),
            Self::Done => Some(Self::InProgress),
        }
    }

    /// Reports whether the stage is terminal.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns the artifact category whose review points gate entry into
    /// this stage, if entry is point-gated at all.
    ///
    /// Entry into `Done` is gated by paper presence rather than points, so
    /// it has no gate category.
    #[must_use]
    pub const fn entry_gate(self) -> Option<ArtifactKind> {
        match self {
            Self::Ready => Some(ArtifactKind::DesignDoc),
            Self::InProgress => Some(ArtifactKind::ImplementationPlan),
            Self::Backlog | Self::Done => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stage string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stage: {0:?}")]
pub struct ParseStageError(String);

impl TryFrom<&str> for Stage {
    type Error = ParseStageError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "backlog" => Ok(Self::Backlog),
            "ready" => Ok(Self::Ready),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            other => Err(ParseStageError(other.to_owned())),
        }
    }
}

/// Review-point requirements for entering point-gated stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageThresholds {
    ready: Points,
    in_progress: Points,
}

impl StageThresholds {
    /// Creates thresholds for the two point-gated stage entries.
    #[must_use]
    pub const fn new(ready: Points, in_progress: Points) -> Self {
        Self { ready, in_progress }
    }

    /// Returns the points required to enter the given stage, or `None`
    /// when entry is not point-gated.
    #[must_use]
    pub const fn entry_requirement(&self, stage: Stage) -> Option<Points> {
        match stage {
            Stage::Ready => Some(self.ready),
            Stage::InProgress => Some(self.in_progress),
            Stage::Backlog | Stage::Done => None,
        }
    }

    /// Returns the points required to enter the ready stage.
    #[must_use]
    pub const fn ready(&self) -> Points {
        self.ready
    }

    /// Returns the points required to enter the in-progress stage.
    #[must_use]
    pub const fn in_progress(&self) -> Points {
        self.in_progress
    }
}

impl Default for StageThresholds {
    /// Both gates default to 5.0 points, ten half-point units.
    fn default() -> Self {
        Self::new(Points::from_half_points(10), Points::from_half_points(10))
    }
}
