pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod prompts;
pub mod tasks;
pub mod worker;

pub use error::{EngineError, StageError};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use pipeline::{Pipeline, PipelineRun, RunState, Stage, StageRole};
pub use tasks::{TaskOutput, TaskRunner, TaskSnapshot};
pub use worker::{Worker, WorkerSpec};
