use adflow_core::errors::BackendError;
use adflow_platform::PlatformError;

use crate::pipeline::StageRole;

/// A stage failure: the failing stage's index plus the unchanged cause.
/// Stored on the `PipelineRun`; stages after the failing one never execute.
#[derive(Clone, Debug, thiserror::Error)]
#[error("stage {stage} ({role}) failed: {source}")]
pub struct StageError {
    pub stage: usize,
    pub role: StageRole,
    #[source]
    pub source: BackendError,
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("stage {stage} cannot depend on stage {dependency}")]
    InvalidDependency { stage: usize, dependency: usize },

    #[error("temperature {0} outside [0, 1]")]
    InvalidTemperature(f64),

    #[error("{0}")]
    Internal(String),
}

impl EngineError {
    /// True when the underlying cause is a cancelled generation call, so the
    /// task cell can resolve to its distinct cancelled terminal state.
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::Stage(StageError {
                source: BackendError::Cancelled,
                ..
            })
        )
    }
}
