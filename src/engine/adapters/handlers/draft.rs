//! Handler drafting documents, code, and papers.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::domain::{ProjectState, Task, TaskEffect, TaskError, TaskResult};
use crate::engine::ports::handler::{HandlerContext, TaskHandler};
use crate::pipeline::domain::{ArtifactFile, ArtifactKind};

use super::render_prompt;

const DESIGN_TEMPLATE: &str = "\
You are the research lead of an automated laboratory.

Write the technical design document for the research idea below.
Cover the hypothesis, the experimental setup, the datasets or
simulations involved, and the measurements that would confirm or
refute the hypothesis.
{% if clarification %}
A reviewer has asked for substantive clarification. Rework the design
from first principles and address the gaps a careful reviewer would
probe.
{% endif %}
Idea: {{ title }}
Identifier: {{ idea }}

Answer with the complete document in Markdown.
";

const PLAN_TEMPLATE: &str = "\
You are the research lead of an automated laboratory.

Write the implementation plan for the research idea below, working
from its approved design document. Lay out the concrete steps, the
code to write, and the order in which to run the experiment.

Idea: {{ title }}
Identifier: {{ idea }}

Design document:
{{ design }}

Answer with the complete plan in Markdown.
";

const CODE_TEMPLATE: &str = "\
You are the research engineer of an automated laboratory.

Write the experiment code for the research idea below, following its
implementation plan. Produce a single self-contained Python script
that runs the experiment end to end and prints its measurements.

Idea: {{ title }}
Identifier: {{ idea }}

Implementation plan:
{{ plan }}

Answer with the complete script only.
";

const PAPER_TEMPLATE: &str = "\
You are the research lead of an automated laboratory.

Write the research paper for the completed experiment below. Structure
the paper with Abstract, Introduction, Method, Results, and Conclusion
sections, and close with a section headed \"References\". List every
source cited in the text as a numbered entry of the form
\"[1] Author, Title, URL\", and cite sources in the text by their
bracketed number.

Idea: {{ title }}
Identifier: {{ idea }}

Design document:
{{ design }}

Answer with the complete paper in Markdown.
";

/// Generation-backed handler producing one artifact category.
///
/// One instance exists per draftable category; each renders its own
/// prompt, feeds the target's source material in, and commits the
/// generated text as the category's primary file.
#[derive(Debug, Clone, Copy)]
pub struct DocumentDraftHandler {
    kind: ArtifactKind,
}

impl DocumentDraftHandler {
    /// Handler drafting technical design documents.
    #[must_use]
    pub const fn design() -> Self {
        Self {
            kind: ArtifactKind::DesignDoc,
        }
    }

    /// Handler drafting implementation plans.
    #[must_use]
    pub const fn implementation_plan() -> Self {
        Self {
            kind: ArtifactKind::ImplementationPlan,
        }
    }

    /// Handler producing experiment code.
    #[must_use]
    pub const fn code() -> Self {
        Self {
            kind: ArtifactKind::Code,
        }
    }

    /// Handler producing research papers.
    #[must_use]
    pub const fn paper() -> Self {
        Self {
            kind: ArtifactKind::Paper,
        }
    }

    fn prepare(
        &self,
        task: &Task,
        state: &ProjectState,
        context: &HandlerContext,
    ) -> Result<(String, String), TaskError> {
        let mut vars = Map::new();
        vars.insert(
            "title".to_owned(),
            Value::String(state.title().to_owned()),
        );
        vars.insert(
            "idea".to_owned(),
            Value::String(state.id().as_str().to_owned()),
        );
        let prompt = match self.kind {
            ArtifactKind::DesignDoc => {
                vars.insert(
                    "clarification".to_owned(),
                    Value::Bool(state.needs_clarification()),
                );
                render_prompt("draft-design", DESIGN_TEMPLATE, vars)?
            }
            ArtifactKind::ImplementationPlan => {
                vars.insert(
                    "design".to_owned(),
                    Value::String(context.require_material(task)?.to_owned()),
                );
                render_prompt("draft-implementation-plan", PLAN_TEMPLATE, vars)?
            }
            ArtifactKind::Code => {
                vars.insert(
                    "plan".to_owned(),
                    Value::String(context.require_material(task)?.to_owned()),
                );
                render_prompt("implement", CODE_TEMPLATE, vars)?
            }
            ArtifactKind::Paper => {
                vars.insert(
                    "design".to_owned(),
                    Value::String(context.require_material(task)?.to_owned()),
                );
                render_prompt("generate-paper", PAPER_TEMPLATE, vars)?
            }
            ArtifactKind::Review => {
                return Err(TaskError::Validation {
                    reason: "reviews are produced by the review handler".to_owned(),
                });
            }
        };
        let message = format!("Add {} for {}", self.kind.display_name(), state.id());
        Ok((prompt, message))
    }
}

#[async_trait]
impl TaskHandler for DocumentDraftHandler {
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError> {
        let state = context.require_state(task)?;
        let (prompt, message) = self.prepare(task, state, context)?;
        let generated = context.generate(&prompt).await?;
        let text = generated.into_text();
        if text.trim().is_empty() {
            return Err(TaskError::Validation {
                reason: format!("generated {} is empty", self.kind.display_name()),
            });
        }
        let Some(file_name) = self.kind.primary_file_name() else {
            return Err(TaskError::Validation {
                reason: format!("{} has no primary file", self.kind.display_name()),
            });
        };
        let file = ArtifactFile::new(file_name, text)?;
        Ok(TaskResult::new(
            task.clone(),
            TaskEffect::CommitArtifact {
                kind: self.kind,
                files: vec![file],
                message,
            },
        ))
    }
}
