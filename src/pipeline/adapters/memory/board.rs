//! Thread-safe in-memory board with scriptable throttling.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::pipeline::domain::{
    ArtifactKind, ArtifactRef, CommitId, Idea, IdeaId, Points, Review, Stage, VersionToken,
    review_directory,
};
use crate::pipeline::ports::board::{
    BoardError, BoardRepository, BoardResult, CommitReceipt, CommitRequest, ReviewReceipt,
    VersionedIdea,
};

/// One commit recorded by the in-memory board, kept for assertions.
#[derive(Debug, Clone)]
pub struct CommitRecord {
    /// Idea the commit belongs to.
    pub idea: IdeaId,
    /// Artifact category that was committed.
    pub kind: ArtifactKind,
    /// Content-addressed commit identifier.
    pub commit: CommitId,
    /// Commit message.
    pub message: String,
    /// Repository paths written by the commit.
    pub paths: Vec<String>,
    /// When the commit was recorded.
    pub committed_at: DateTime<Utc>,
}

/// Thread-safe in-memory board repository.
///
/// Version tokens are per-idea counters rendered as `v<n>`. Commits are
/// content-addressed, so replaying an identical commit returns the
/// original receipt without duplicating state, mirroring how a resumed
/// run finds its work already applied. Tests may script rate-limit
/// responses per operation to exercise retry behaviour.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBoard {
    state: Arc<RwLock<BoardState>>,
}

#[derive(Debug, Default)]
struct BoardState {
    ideas: BTreeMap<IdeaId, StoredIdea>,
    commits: Vec<CommitRecord>,
    files: BTreeMap<String, String>,
    throttles: VecDeque<PlannedThrottle>,
}

#[derive(Debug)]
struct StoredIdea {
    idea: Idea,
    version: u64,
}

#[derive(Debug)]
struct PlannedThrottle {
    operation: String,
    retry_after: Duration,
}

fn token(version: u64) -> VersionToken {
    VersionToken::new(format!("v{version}"))
}

fn check_version(stored: &StoredIdea, supplied: &VersionToken, id: &IdeaId) -> BoardResult<()> {
    let current = token(stored.version);
    if *supplied == current {
        Ok(())
    } else {
        Err(BoardError::Conflict {
            idea: id.clone(),
            supplied: supplied.clone(),
            current,
        })
    }
}

impl InMemoryBoard {
    /// Creates an empty in-memory board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an idea directly, bypassing the registration flow, and
    /// returns its version token.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn seed_idea(&self, idea: Idea) -> BoardResult<VersionToken> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        let id = idea.id().clone();
        state.ideas.insert(id, StoredIdea { idea, version: 1 });
        Ok(token(1))
    }

    /// Schedules a rate-limit response for the next call of the named
    /// operation, with the given retry-after delay.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn schedule_rate_limit(&self, operation: &str, retry_after: Duration) -> BoardResult<()> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.throttles.push_back(PlannedThrottle {
            operation: operation.to_owned(),
            retry_after,
        });
        Ok(())
    }

    /// Returns every commit recorded so far, in order.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn commit_log(&self) -> BoardResult<Vec<CommitRecord>> {
        let state = self.state.read().map_err(|_| BoardError::LockPoisoned)?;
        Ok(state.commits.clone())
    }

    /// Returns the stored contents of a repository file, if present.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::LockPoisoned`] when the state lock is
    /// poisoned.
    pub fn file(&self, path: &str) -> BoardResult<Option<String>> {
        let state = self.state.read().map_err(|_| BoardError::LockPoisoned)?;
        Ok(state.files.get(path).cloned())
    }
}

impl BoardState {
    fn consume_throttle(&mut self, operation: &str) -> BoardResult<()> {
        let scheduled = self
            .throttles
            .front()
            .is_some_and(|planned| planned.operation == operation);
        if !scheduled {
            return Ok(());
        }
        self.throttles.pop_front().map_or(Ok(()), |planned| {
            Err(BoardError::RateLimited {
                operation: planned.operation,
                retry_after: planned.retry_after,
            })
        })
    }

    fn stored(&self, id: &IdeaId) -> BoardResult<&StoredIdea> {
        self.ideas
            .get(id)
            .ok_or_else(|| BoardError::IdeaNotFound(id.clone()))
    }

    fn stored_mut(&mut self, id: &IdeaId) -> BoardResult<&mut StoredIdea> {
        self.ideas
            .get_mut(id)
            .ok_or_else(|| BoardError::IdeaNotFound(id.clone()))
    }
}

fn content_address(request: &CommitRequest) -> CommitId {
    let mut hasher = Sha256::new();
    hasher.update(request.idea().as_str().as_bytes());
    hasher.update(request.kind().as_str().as_bytes());
    hasher.update(request.message().as_bytes());
    for file in request.files() {
        hasher.update(file.path().as_bytes());
        hasher.update(file.contents().as_bytes());
    }
    let digest = hasher.finalize();
    let hex: String = digest.iter().map(|byte| format!("{byte:02x}")).collect();
    CommitId::new(hex)
}

#[async_trait]
impl BoardRepository for InMemoryBoard {
    async fn list_ideas(&self, stage: Option<Stage>) -> BoardResult<Vec<VersionedIdea>> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("list_ideas")?;
        let ideas = state
            .ideas
            .values()
            .filter(|stored| stage.is_none_or(|wanted| stored.idea.stage() == wanted))
            .map(|stored| VersionedIdea {
                idea: stored.idea.clone(),
                version: token(stored.version),
            })
            .collect();
        Ok(ideas)
    }

    async fn get_idea(&self, id: &IdeaId) -> BoardResult<VersionedIdea> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("get_idea")?;
        let stored = state.stored(id)?;
        Ok(VersionedIdea {
            idea: stored.idea.clone(),
            version: token(stored.version),
        })
    }

    async fn register_idea(&self, idea: &Idea) -> BoardResult<VersionToken> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("register_idea")?;
        if state.ideas.contains_key(idea.id()) {
            return Err(BoardError::DuplicateIdea(idea.id().clone()));
        }
        state.ideas.insert(
            idea.id().clone(),
            StoredIdea {
                idea: idea.clone(),
                version: 1,
            },
        );
        Ok(token(1))
    }

    async fn update_idea(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        idea: &Idea,
    ) -> BoardResult<VersionToken> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("update_idea")?;
        let stored = state.stored_mut(id)?;
        check_version(stored, version, id)?;
        stored.idea = idea.clone();
        stored.version = stored.version.saturating_add(1);
        Ok(token(stored.version))
    }

    async fn append_review(
        &self,
        id: &IdeaId,
        version: &VersionToken,
        review: &Review,
        weight: Points,
    ) -> BoardResult<ReviewReceipt> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("append_review")?;
        let stored = state.stored_mut(id)?;
        check_version(stored, version, id)?;
        // Mutate a copy so a rejected event leaves the stored state intact.
        let mut updated = stored.idea.clone();
        let total = updated.record_review(review, weight)?;
        stored.idea = updated;
        stored.version = stored.version.saturating_add(1);
        let receipt = ReviewReceipt {
            total,
            version: token(stored.version),
            reset: review.requests_clarification(),
        };
        let path = format!("{}{}", review_directory(id, review.target()), review.file_name());
        state.files.insert(path, review.body().to_owned());
        Ok(receipt)
    }

    async fn commit_artifacts(&self, request: &CommitRequest) -> BoardResult<CommitReceipt> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("commit_artifacts")?;
        let commit = content_address(request);
        let location = request.kind().directory(request.idea());

        // A replayed identical commit is already applied; hand back the
        // original receipt so resumed runs converge without duplicates.
        let replayed = state
            .commits
            .iter()
            .any(|record| record.idea == *request.idea() && record.commit == commit);
        if replayed {
            let stored = state.stored(request.idea())?;
            return Ok(CommitReceipt {
                commit,
                location,
                version: token(stored.version),
            });
        }

        let stored = state.stored_mut(request.idea())?;
        check_version(stored, request.version(), request.idea())?;
        stored.idea.bind_artifact(ArtifactRef::new(
            request.kind(),
            location.clone(),
            commit.clone(),
            request.committed_at(),
        ));
        stored.version = stored.version.saturating_add(1);
        let version = token(stored.version);

        let mut paths = Vec::with_capacity(request.files().len());
        for file in request.files() {
            let path = format!("{location}{}", file.path());
            paths.push(path.clone());
            state.files.insert(path, file.contents().to_owned());
        }
        state.commits.push(CommitRecord {
            idea: request.idea().clone(),
            kind: request.kind(),
            commit: commit.clone(),
            message: request.message().to_owned(),
            paths,
            committed_at: request.committed_at(),
        });
        Ok(CommitReceipt {
            commit,
            location,
            version,
        })
    }

    async fn read_artifact(&self, id: &IdeaId, kind: ArtifactKind) -> BoardResult<String> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("read_artifact")?;
        let stored = state.stored(id)?;
        let artifact = stored
            .idea
            .artifact(kind)
            .ok_or_else(|| BoardError::ArtifactMissing {
                idea: id.clone(),
                kind,
            })?;
        let primary = kind
            .primary_file_name()
            .ok_or_else(|| BoardError::ArtifactMissing {
                idea: id.clone(),
                kind,
            })?;
        let path = format!("{}{primary}", artifact.location());
        state
            .files
            .get(&path)
            .cloned()
            .ok_or_else(|| BoardError::ArtifactMissing {
                idea: id.clone(),
                kind,
            })
    }

    async fn annotate(&self, id: &IdeaId, note: &str) -> BoardResult<()> {
        let mut state = self.state.write().map_err(|_| BoardError::LockPoisoned)?;
        state.consume_throttle("annotate")?;
        let stored = state.stored(id)?;
        let path = format!("notes/{}/{}.md", stored.idea.id(), state.commits.len());
        state.files.insert(path, note.to_owned());
        Ok(())
    }
}
