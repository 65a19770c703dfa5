//! Handler moving an idea one stage forward.

use async_trait::async_trait;

use crate::engine::domain::{Task, TaskEffect, TaskError, TaskResult};
use crate::engine::ports::handler::{HandlerContext, TaskHandler};

/// Deterministic handler for stage advancement.
///
/// The selector only proposes advancement once the gate is satisfied,
/// so the handler simply restates the transition as an effect. The
/// domain re-checks adjacency and gating when the effect is applied,
/// which catches the board moving underneath the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageAdvanceHandler;

#[async_trait]
impl TaskHandler for StageAdvanceHandler {
    async fn execute(&self, task: &Task, context: &HandlerContext) -> Result<TaskResult, TaskError> {
        let state = context.require_state(task)?;
        let to = task.to_stage().ok_or_else(|| TaskError::MissingTarget {
            task: task.id().clone(),
        })?;
        Ok(TaskResult::new(
            task.clone(),
            TaskEffect::AdvanceStage {
                from: state.stage(),
                to,
            },
        ))
    }
}
