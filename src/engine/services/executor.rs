//! Concurrent task execution over a handler table.

use tokio::task::JoinSet;
use tracing::warn;

use crate::engine::adapters::handlers::HandlerTable;
use crate::engine::domain::{Task, TaskError, TaskResult};
use crate::engine::ports::HandlerContext;

/// Dispatches tasks to their handlers, batches on worker tasks.
///
/// Every batch entry runs on its own worker; results come back in the
/// order the batch was submitted, so commit order stays deterministic
/// regardless of which worker finishes first.
#[derive(Debug, Clone)]
pub struct TaskExecutor {
    handlers: HandlerTable,
}

impl TaskExecutor {
    /// Creates an executor over the given handler table.
    #[must_use]
    pub const fn new(handlers: HandlerTable) -> Self {
        Self { handlers }
    }

    /// Executes a single task to completion.
    pub async fn execute(
        &self,
        task: &Task,
        context: &HandlerContext,
    ) -> Result<TaskResult, TaskError> {
        let handler = self.handlers.handler_for(task.kind());
        handler.execute(task, context).await
    }

    /// Executes a batch concurrently, one worker per entry.
    ///
    /// A worker that panics or is cancelled drops out of the result
    /// set; its task is simply absent, as if never selected.
    pub async fn execute_batch(
        &self,
        batch: Vec<(Task, HandlerContext)>,
    ) -> Vec<(Task, Result<TaskResult, TaskError>)> {
        let mut workers = JoinSet::new();
        for (index, (task, context)) in batch.into_iter().enumerate() {
            let handler = self.handlers.handler_for(task.kind());
            workers.spawn(async move {
                let outcome = handler.execute(&task, &context).await;
                (index, task, outcome)
            });
        }
        let mut finished = Vec::with_capacity(workers.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(entry) => finished.push(entry),
                Err(error) => warn!(%error, "task worker panicked or was cancelled"),
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);
        finished
            .into_iter()
            .map(|(_, task, outcome)| (task, outcome))
            .collect()
    }
}
