//! Handler inventing a new research idea.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::engine::domain::{Task, TaskEffect, TaskError, TaskResult};
use crate::engine::ports::handler::{HandlerContext, TaskHandler};
use crate::pipeline::domain::IdeaId;

use super::render_prompt;

const BRAINSTORM_TEMPLATE: &str = "\
You are the research lead of an automated laboratory.

Propose one new research idea that is not already being explored.

Ideas already on the board:
{% for idea in known_ideas %}- {{ idea }}
{% endfor %}{% if not known_ideas %}- (none)
{% endif %}
Answer with exactly three lines:
Slug: a short kebab-case identifier for the idea
Title: a one-line title
Summary: a one-paragraph summary of the idea and its experiment
";

/// Generation-backed handler that replenishes the backlog.
///
/// The prompt lists every idea already on the board so the model does
/// not propose duplicates; the handler still rejects a clashing slug
/// outright, since the model may ignore the instruction.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrainstormHandler;

fn field<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines()
        .find_map(|line| line.trim().strip_prefix(label).map(str::trim))
        .filter(|value| !value.is_empty())
}

fn required<'a>(text: &'a str, label: &str) -> Result<&'a str, TaskError> {
    field(text, label).ok_or_else(|| TaskError::Validation {
        reason: format!("generated idea is missing its {label} line"),
    })
}

#[async_trait]
impl TaskHandler for BrainstormHandler {
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError> {
        let mut vars = Map::new();
        vars.insert(
            "known_ideas".to_owned(),
            Value::Array(
                context
                    .known_ideas()
                    .iter()
                    .map(|id| Value::String(id.as_str().to_owned()))
                    .collect(),
            ),
        );
        let prompt = render_prompt("brainstorm-idea", BRAINSTORM_TEMPLATE, vars)?;
        let generated = context.generate(&prompt).await?;
        let text = generated.into_text();

        let slug = required(&text, "Slug:")?;
        let title = required(&text, "Title:")?;
        let summary = required(&text, "Summary:")?;

        let id = IdeaId::new(slug).map_err(|error| TaskError::Validation {
            reason: format!("generated idea slug is invalid: {error}"),
        })?;
        if context.known_ideas().contains(&id) {
            return Err(TaskError::Validation {
                reason: format!("generated idea {id} already exists on the board"),
            });
        }

        Ok(TaskResult::new(
            task.clone(),
            TaskEffect::RegisterIdea {
                id,
                title: title.to_owned(),
                summary: summary.to_owned(),
            },
        ))
    }
}
