//! Handler reviewing a bound artifact.

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};

use crate::engine::domain::{Task, TaskEffect, TaskError, TaskResult};
use crate::engine::ports::handler::{HandlerContext, TaskHandler};
use crate::pipeline::domain::{Review, ReviewAuthor, ReviewGrade};

use super::render_prompt;

const REVIEW_TEMPLATE: &str = "\
You are a critical reviewer in an automated research laboratory.

Review the {{ kind }} below for the research idea \"{{ title }}\".
Judge its rigour, clarity, and feasibility, and point out concrete
weaknesses. End your review with a line of the form \"Grade: n/10\"
where n is a whole number from 1 to 10.

Identifier: {{ idea }}

Document under review:
{{ document }}
";

const GRADE_PATTERN: &str = r"(?m)^Grade:\s*(\d{1,2})\s*/\s*10\s*$";

/// Generation-backed handler producing reviews.
///
/// The full generated text becomes the review body; the grade is read
/// from the closing `Grade: n/10` line. Reviews written here never
/// request clarification, that signal is reserved for humans.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReviewHandler;

fn parse_grade(text: &str) -> Result<ReviewGrade, TaskError> {
    let pattern = Regex::new(GRADE_PATTERN).map_err(|error| TaskError::Validation {
        reason: format!("grade pattern failed to compile: {error}"),
    })?;
    let digits = pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| TaskError::Validation {
            reason: "generated review does not end with a line of the form Grade: n/10".to_owned(),
        })?;
    let value = digits
        .as_str()
        .parse::<u8>()
        .map_err(|error| TaskError::Validation {
            reason: format!("generated review grade is not a number: {error}"),
        })?;
    ReviewGrade::new(value).map_err(|error| TaskError::Validation {
        reason: format!("generated review grade is out of range: {error}"),
    })
}

#[async_trait]
impl TaskHandler for ReviewHandler {
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError> {
        let state = context.require_state(task)?;
        let target = task.review_target().ok_or_else(|| TaskError::MissingTarget {
            task: task.id().clone(),
        })?;
        let document = context.require_material(task)?;

        let mut vars = Map::new();
        vars.insert(
            "kind".to_owned(),
            Value::String(target.display_name().to_owned()),
        );
        vars.insert(
            "title".to_owned(),
            Value::String(state.title().to_owned()),
        );
        vars.insert(
            "idea".to_owned(),
            Value::String(state.id().as_str().to_owned()),
        );
        vars.insert("document".to_owned(), Value::String(document.to_owned()));
        let prompt = render_prompt("write-review", REVIEW_TEMPLATE, vars)?;

        let generated = context.generate(&prompt).await?;
        let grade = parse_grade(generated.text())?;
        let author = ReviewAuthor::llm(generated.model().as_str())?;
        let review = Review::new(author, grade, target, generated.text(), context.now())?;

        Ok(TaskResult::new(
            task.clone(),
            TaskEffect::AppendReview { review },
        ))
    }
}
