//! Identifier types for the research pipeline.

use std::fmt;

use uuid::Uuid;

use super::error::PipelineDomainError;

/// Maximum length of an idea identifier slug in characters.
pub const MAX_IDEA_ID_LENGTH: usize = 64;

/// Validated identifier for a research idea.
///
/// Idea identifiers double as tracker issue keys and as directory names
/// inside the research repository, so the charset is restricted to slugs
/// that are safe in both URLs and file paths.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IdeaId(String);

impl IdeaId {
    /// Creates an idea identifier from a raw slug.
    ///
    /// Input is trimmed and lowercased before validation.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineDomainError::EmptyIdeaId`] when the trimmed input
    /// is empty, [`PipelineDomainError::IdeaIdTooLong`] when it exceeds
    /// [`MAX_IDEA_ID_LENGTH`] characters, and
    /// [`PipelineDomainError::InvalidIdeaId`] when it contains characters
    /// outside `[a-z0-9-]` or carries a leading or trailing hyphen.
    pub fn new(raw: &str) -> Result<Self, PipelineDomainError> {
        let slug = raw.trim().to_lowercase();
        if slug.is_empty() {
            return Err(PipelineDomainError::EmptyIdeaId);
        }
        let length = slug.chars().count();
        if length > MAX_IDEA_ID_LENGTH {
            return Err(PipelineDomainError::IdeaIdTooLong {
                length,
                max: MAX_IDEA_ID_LENGTH,
            });
        }
        let charset_ok = slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !charset_ok || slug.starts_with('-') || slug.ends_with('-') {
            return Err(PipelineDomainError::InvalidIdeaId { actual: slug });
        }
        Ok(Self(slug))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for IdeaId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for a single orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a fresh random run identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RunId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque optimistic-concurrency token attached to every board read.
///
/// Tokens are produced by board adapters and compared verbatim; callers
/// never inspect or construct token contents beyond round-tripping them
/// into conditional writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wraps a raw token value produced by a board adapter.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of a commit recorded in the research repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommitId(String);

impl CommitId {
    /// Wraps a raw commit identifier produced by a board adapter.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
