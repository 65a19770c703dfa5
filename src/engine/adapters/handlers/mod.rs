//! Task handler implementations and their dispatch table.
//!
//! One handler exists per task kind. Generation-backed handlers render
//! a prompt template, call the generator, and validate what comes back;
//! the advancement and reference-validation handlers are deterministic.
//! All of them return effects and leave board writes to the
//! orchestrator.

mod advance;
mod brainstorm;
mod draft;
mod review;
mod validate;

use std::fmt;
use std::sync::Arc;

use minijinja::Environment;
use serde_json::{Map, Value};

use crate::engine::domain::{TaskError, TaskKind};
use crate::engine::ports::handler::TaskHandler;

pub use advance::StageAdvanceHandler;
pub use brainstorm::BrainstormHandler;
pub use draft::DocumentDraftHandler;
pub use review::ReviewHandler;
pub use validate::ReferenceValidationHandler;

/// Renders a prompt template against its context variables.
pub(crate) fn render_prompt(
    name: &str,
    template: &str,
    context: Map<String, Value>,
) -> Result<String, TaskError> {
    let environment = Environment::new();
    environment
        .render_str(template, context)
        .map_err(|error| TaskError::Template {
            name: name.to_owned(),
            reason: error.to_string(),
        })
}

/// Dispatch table mapping each task kind to its handler.
///
/// The table is closed: every kind has exactly one slot, so adding a
/// kind without wiring a handler fails to compile. Tests may swap
/// individual slots to script handler behaviour.
#[derive(Clone)]
pub struct HandlerTable {
    advance: Arc<dyn TaskHandler>,
    brainstorm: Arc<dyn TaskHandler>,
    draft_design: Arc<dyn TaskHandler>,
    draft_plan: Arc<dyn TaskHandler>,
    implement: Arc<dyn TaskHandler>,
    paper: Arc<dyn TaskHandler>,
    review: Arc<dyn TaskHandler>,
    validate: Arc<dyn TaskHandler>,
}

impl HandlerTable {
    /// Builds the table with the production handler for every kind.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            advance: Arc::new(StageAdvanceHandler),
            brainstorm: Arc::new(BrainstormHandler),
            draft_design: Arc::new(DocumentDraftHandler::design()),
            draft_plan: Arc::new(DocumentDraftHandler::implementation_plan()),
            implement: Arc::new(DocumentDraftHandler::code()),
            paper: Arc::new(DocumentDraftHandler::paper()),
            review: Arc::new(ReviewHandler),
            validate: Arc::new(ReferenceValidationHandler),
        }
    }

    /// Replaces the handler for one kind.
    #[must_use]
    pub fn with_handler(mut self, kind: TaskKind, handler: Arc<dyn TaskHandler>) -> Self {
        match kind {
            TaskKind::AdvanceStage => self.advance = handler,
            TaskKind::BrainstormIdea => self.brainstorm = handler,
            TaskKind::DraftDesign => self.draft_design = handler,
            TaskKind::DraftImplementationPlan => self.draft_plan = handler,
            TaskKind::Implement => self.implement = handler,
            TaskKind::GeneratePaper => self.paper = handler,
            TaskKind::WriteReview => self.review = handler,
            TaskKind::ValidateReferences => self.validate = handler,
        }
        self
    }

    /// Returns the handler for the given kind.
    #[must_use]
    pub fn handler_for(&self, kind: TaskKind) -> Arc<dyn TaskHandler> {
        match kind {
            TaskKind::AdvanceStage => Arc::clone(&self.advance),
            TaskKind::BrainstormIdea => Arc::clone(&self.brainstorm),
            TaskKind::DraftDesign => Arc::clone(&self.draft_design),
            TaskKind::DraftImplementationPlan => Arc::clone(&self.draft_plan),
            TaskKind::Implement => Arc::clone(&self.implement),
            TaskKind::GeneratePaper => Arc::clone(&self.paper),
            TaskKind::WriteReview => Arc::clone(&self.review),
            TaskKind::ValidateReferences => Arc::clone(&self.validate),
        }
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerTable").finish_non_exhaustive()
    }
}
