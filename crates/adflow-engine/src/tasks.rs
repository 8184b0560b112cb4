//! Background execution with pollable result cells.
//!
//! Every pipeline invocation triggered by a client request runs through
//! `TaskRunner::submit`, so the request path never blocks on a
//! generation-backend round trip. The caller gets a `TaskId` immediately and
//! polls until the cell reaches a terminal state.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use adflow_core::ids::TaskId;

use crate::error::EngineError;

/// What a finished operation produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskOutput {
    /// A single reply (chat message, standalone stage).
    Text(String),
    /// Per-stage outputs of a pipeline run, in execution order.
    StageOutputs(Vec<String>),
}

/// Point-in-time view of a task cell. Identical on every poll after the
/// terminal write.
#[derive(Clone, Debug)]
pub struct TaskSnapshot {
    pub output: Option<TaskOutput>,
    pub is_complete: bool,
    pub error: Option<String>,
    pub cancelled: bool,
}

impl TaskSnapshot {
    /// The single-text view of the output, empty while running or on error.
    pub fn content(&self) -> &str {
        match &self.output {
            Some(TaskOutput::Text(text)) => text,
            Some(TaskOutput::StageOutputs(outputs)) => {
                outputs.last().map(String::as_str).unwrap_or("")
            }
            None => "",
        }
    }

    /// The pipeline's stage output at `index`, if the task produced one.
    pub fn stage_output(&self, index: usize) -> Option<&str> {
        match &self.output {
            Some(TaskOutput::StageOutputs(outputs)) => outputs.get(index).map(String::as_str),
            _ => None,
        }
    }
}

enum CellState {
    Running,
    Done(TaskOutput),
    Failed(String),
    Cancelled,
}

/// One task's result cell. The terminal transition is written exactly once,
/// by the spawned operation, on every exit path.
struct TaskCell {
    state: RwLock<CellState>,
    cancel: CancellationToken,
}

impl TaskCell {
    fn new() -> Self {
        Self {
            state: RwLock::new(CellState::Running),
            cancel: CancellationToken::new(),
        }
    }

    fn finish(&self, result: Result<TaskOutput, EngineError>) {
        let mut state = self.state.write();
        if !matches!(*state, CellState::Running) {
            return;
        }
        *state = match result {
            Ok(output) => CellState::Done(output),
            Err(e) if e.is_cancellation() => CellState::Cancelled,
            Err(e) => CellState::Failed(e.to_string()),
        };
    }

    fn snapshot(&self) -> TaskSnapshot {
        match &*self.state.read() {
            CellState::Running => TaskSnapshot {
                output: None,
                is_complete: false,
                error: None,
                cancelled: false,
            },
            CellState::Done(output) => TaskSnapshot {
                output: Some(output.clone()),
                is_complete: true,
                error: None,
                cancelled: false,
            },
            CellState::Failed(error) => TaskSnapshot {
                output: None,
                is_complete: true,
                error: Some(error.clone()),
                cancelled: false,
            },
            CellState::Cancelled => TaskSnapshot {
                output: None,
                is_complete: true,
                error: Some("cancelled".to_string()),
                cancelled: true,
            },
        }
    }
}

/// Schedules operations off the caller's path and exposes their result
/// cells for polling.
pub struct TaskRunner {
    tasks: DashMap<TaskId, Arc<TaskCell>>,
}

impl TaskRunner {
    pub fn new() -> Self {
        Self { tasks: DashMap::new() }
    }

    /// Schedule an operation. Returns immediately; the operation itself
    /// performs the cell's single terminal write when it finishes. A panic
    /// inside the operation is captured as a failure, never surfaced as a
    /// process fault.
    pub fn submit<F, Fut>(&self, operation: F) -> TaskId
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = Result<TaskOutput, EngineError>> + Send + 'static,
    {
        let id = TaskId::new();
        let cell = Arc::new(TaskCell::new());
        self.tasks.insert(id.clone(), Arc::clone(&cell));

        let future = operation(cell.cancel.clone());
        let task_id = id.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(future).await {
                Ok(result) => result,
                Err(join_error) => {
                    tracing::error!(task_id = %task_id, error = %join_error, "task panicked");
                    Err(EngineError::Internal(format!("task aborted: {join_error}")))
                }
            };
            if let Err(ref e) = outcome {
                tracing::warn!(task_id = %task_id, error = %e, "background task failed");
            }
            cell.finish(outcome);
        });

        id
    }

    /// Non-blocking read of a task's current state.
    pub fn poll(&self, id: &TaskId) -> Option<TaskSnapshot> {
        self.tasks.get(id).map(|cell| cell.snapshot())
    }

    /// Request cancellation. The generation call observes the token and the
    /// cell resolves to its cancelled terminal state. Returns false for
    /// unknown or already-finished tasks.
    pub fn cancel(&self, id: &TaskId) -> bool {
        match self.tasks.get(id) {
            Some(cell) if !cell.snapshot().is_complete => {
                cell.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop finished task cells, keeping the map bounded.
    pub fn prune_finished(&self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|_, cell| !cell.snapshot().is_complete);
        before - self.tasks.len()
    }
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use adflow_core::errors::BackendError;

    use crate::error::StageError;
    use crate::pipeline::StageRole;

    async fn wait_complete(runner: &TaskRunner, id: &TaskId) -> TaskSnapshot {
        for _ in 0..100 {
            let snapshot = runner.poll(id).unwrap();
            if snapshot.is_complete {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("task {id} did not complete");
    }

    #[tokio::test]
    async fn incomplete_immediately_after_submit() {
        let runner = TaskRunner::new();
        let id = runner.submit(|_cancel| async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Ok(TaskOutput::Text("done".into()))
        });

        let snapshot = runner.poll(&id).unwrap();
        assert!(!snapshot.is_complete);
        assert_eq!(snapshot.content(), "");
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn completes_exactly_once_and_polls_idempotently() {
        let runner = TaskRunner::new();
        let id = runner.submit(|_cancel| async { Ok(TaskOutput::Text("the reply".into())) });

        let first = wait_complete(&runner, &id).await;
        assert_eq!(first.content(), "the reply");
        assert!(first.error.is_none());

        // Repeated polls return an identical terminal snapshot.
        for _ in 0..3 {
            let again = runner.poll(&id).unwrap();
            assert!(again.is_complete);
            assert_eq!(again.content(), "the reply");
            assert!(again.error.is_none());
        }
    }

    #[tokio::test]
    async fn failure_is_captured_in_the_cell() {
        let runner = TaskRunner::new();
        let id = runner.submit(|_cancel| async {
            Err(EngineError::Stage(StageError {
                stage: 1,
                role: StageRole::CampaignBuilder,
                source: BackendError::Unavailable { status: 503, body: "overloaded".into() },
            }))
        });

        let snapshot = wait_complete(&runner, &id).await;
        assert!(snapshot.is_complete);
        assert_eq!(snapshot.content(), "");
        let error = snapshot.error.unwrap();
        assert!(error.contains("stage 1"));
        assert!(error.contains("overloaded"));
        assert!(!snapshot.cancelled);
    }

    #[tokio::test]
    async fn panic_becomes_a_failed_cell() {
        let runner = TaskRunner::new();
        let id = runner.submit(|_cancel| async { panic!("boom") });

        let snapshot = wait_complete(&runner, &id).await;
        assert!(snapshot.is_complete);
        assert!(snapshot.error.is_some());
        assert!(!snapshot.cancelled);
    }

    #[tokio::test]
    async fn cancel_resolves_to_distinct_terminal_state() {
        let runner = TaskRunner::new();
        let id = runner.submit(|cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(EngineError::Stage(StageError {
                    stage: 0,
                    role: StageRole::Strategist,
                    source: BackendError::Cancelled,
                })),
                _ = tokio::time::sleep(Duration::from_secs(10)) => {
                    Ok(TaskOutput::Text("never".into()))
                }
            }
        });

        assert!(runner.cancel(&id));
        let snapshot = wait_complete(&runner, &id).await;
        assert!(snapshot.cancelled);
        assert!(snapshot.is_complete);
    }

    #[tokio::test]
    async fn cancel_unknown_or_finished_returns_false() {
        let runner = TaskRunner::new();
        assert!(!runner.cancel(&TaskId::new()));

        let id = runner.submit(|_cancel| async { Ok(TaskOutput::Text("done".into())) });
        let _ = wait_complete(&runner, &id).await;
        assert!(!runner.cancel(&id));
    }

    #[tokio::test]
    async fn stage_outputs_are_readable_by_index() {
        let runner = TaskRunner::new();
        let id = runner.submit(|_cancel| async {
            Ok(TaskOutput::StageOutputs(vec![
                "strategy".into(),
                "structure".into(),
                "specs".into(),
            ]))
        });

        let snapshot = wait_complete(&runner, &id).await;
        assert_eq!(snapshot.stage_output(0), Some("strategy"));
        assert_eq!(snapshot.stage_output(2), Some("specs"));
        assert_eq!(snapshot.stage_output(3), None);
        // The text view is the final stage's output.
        assert_eq!(snapshot.content(), "specs");
    }

    #[tokio::test]
    async fn poll_unknown_task_is_none() {
        let runner = TaskRunner::new();
        assert!(runner.poll(&TaskId::new()).is_none());
    }

    #[tokio::test]
    async fn prune_drops_only_finished_cells() {
        let runner = TaskRunner::new();
        let done = runner.submit(|_cancel| async { Ok(TaskOutput::Text("done".into())) });
        let _ = wait_complete(&runner, &done).await;
        let running = runner.submit(|_cancel| async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(TaskOutput::Text("later".into()))
        });

        assert_eq!(runner.prune_finished(), 1);
        assert!(runner.poll(&done).is_none());
        assert!(runner.poll(&running).is_some());
    }
}
