//! Port contract for task handlers.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::engine::domain::{ProjectState, Task, TaskError, TaskResult};
use crate::model::domain::GeneratedText;
use crate::model::services::ProviderResult;
use crate::pipeline::domain::IdeaId;

use super::generation::TextGenerator;

/// Everything a handler may consult while executing one task.
///
/// The context is assembled per task by the orchestrator and owns its
/// data outright, so handler execution can move to a worker without
/// borrowing from the run loop. Handlers read the target's project
/// state and any prefetched source material; they reach the outside
/// world only through the generator.
#[derive(Clone)]
pub struct HandlerContext {
    state: Option<ProjectState>,
    known_ideas: Vec<IdeaId>,
    material: Option<String>,
    generator: Arc<dyn TextGenerator>,
    max_tokens: u32,
    now: DateTime<Utc>,
}

impl HandlerContext {
    /// Creates a context with no target state or material.
    #[must_use]
    pub const fn new(generator: Arc<dyn TextGenerator>, max_tokens: u32, now: DateTime<Utc>) -> Self {
        Self {
            state: None,
            known_ideas: Vec::new(),
            material: None,
            generator,
            max_tokens,
            now,
        }
    }

    /// Attaches the target idea's project state.
    #[must_use]
    pub fn with_state(mut self, state: ProjectState) -> Self {
        self.state = Some(state);
        self
    }

    /// Attaches the identifiers of every idea on the board.
    #[must_use]
    pub fn with_known_ideas(mut self, ideas: Vec<IdeaId>) -> Self {
        self.known_ideas = ideas;
        self
    }

    /// Attaches prefetched source material, such as the document a
    /// review task is aimed at.
    #[must_use]
    pub fn with_material(mut self, material: String) -> Self {
        self.material = Some(material);
        self
    }

    /// Returns the target idea's project state, if attached.
    #[must_use]
    pub const fn state(&self) -> Option<&ProjectState> {
        self.state.as_ref()
    }

    /// Returns the target's state or fails the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingState`] when no state was attached.
    pub fn require_state(&self, task: &Task) -> Result<&ProjectState, TaskError> {
        self.state.as_ref().ok_or_else(|| TaskError::MissingState {
            task: task.id().clone(),
        })
    }

    /// Returns the prefetched material or fails the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::MissingState`] when no material was
    /// attached.
    pub fn require_material(&self, task: &Task) -> Result<&str, TaskError> {
        self.material
            .as_deref()
            .ok_or_else(|| TaskError::MissingState {
                task: task.id().clone(),
            })
    }

    /// Returns the identifiers of every idea on the board.
    #[must_use]
    pub fn known_ideas(&self) -> &[IdeaId] {
        &self.known_ideas
    }

    /// Returns the instant the task batch started executing.
    #[must_use]
    pub const fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Generates text for the prompt under the run's token cap.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::model::services::ProviderError`] when
    /// generation fails.
    pub async fn generate(&self, prompt: &str) -> ProviderResult<GeneratedText> {
        self.generator.generate(prompt, self.max_tokens).await
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerContext")
            .field("state", &self.state)
            .field("known_ideas", &self.known_ideas)
            .field("material", &self.material)
            .field("max_tokens", &self.max_tokens)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// Executes one kind of task against its context.
///
/// Handlers are pure with respect to the board: they read the context,
/// possibly call the generator, and describe the board mutation they
/// want as a [`crate::engine::domain::TaskEffect`]. The orchestrator
/// owns applying effects and every retry decision.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    /// Executes the task, returning the effect to apply.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskError`] when the task cannot produce an
    /// acceptable effect.
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError>;
}
