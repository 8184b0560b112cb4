use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use adflow_core::backend::{CompletionBackend, CompletionRequest};
use adflow_core::errors::BackendError;
use adflow_core::tools::ToolSpec;

use crate::error::EngineError;

/// Role/goal/persona configuration plus generation parameters for one worker.
#[derive(Clone, Debug)]
pub struct WorkerSpec {
    pub role: String,
    pub goal: String,
    pub persona: String,
    pub model: String,
    pub temperature: f64,
    pub tools: Vec<ToolSpec>,
    pub allow_delegation: bool,
}

/// The worker's bound generation configuration. Immutable: reconfiguration
/// builds a fresh binding and swaps the reference, so an in-flight `execute`
/// keeps its snapshot and the next call sees the rebuilt configuration.
struct Binding {
    spec: WorkerSpec,
}

impl Binding {
    fn request(&self, prompt: &str) -> CompletionRequest {
        CompletionRequest {
            persona: self.spec.persona.clone(),
            goal: self.spec.goal.clone(),
            prompt: prompt.to_string(),
            model: self.spec.model.clone(),
            temperature: self.spec.temperature,
            tools: self.spec.tools.clone(),
        }
    }
}

/// A role-bound caller of the generation backend.
pub struct Worker {
    backend: Arc<dyn CompletionBackend>,
    binding: RwLock<Arc<Binding>>,
}

impl Worker {
    pub fn new(backend: Arc<dyn CompletionBackend>, spec: WorkerSpec) -> Result<Self, EngineError> {
        validate_temperature(spec.temperature)?;
        Ok(Self {
            backend,
            binding: RwLock::new(Arc::new(Binding { spec })),
        })
    }

    pub fn role(&self) -> String {
        self.binding.read().spec.role.clone()
    }

    pub fn temperature(&self) -> f64 {
        self.binding.read().spec.temperature
    }

    pub fn tools(&self) -> Vec<ToolSpec> {
        self.binding.read().spec.tools.clone()
    }

    /// Attach a capability. Rebuilds the binding; a tool already present by
    /// name is not attached twice, so re-attachment is idempotent.
    pub fn add_tool(&self, tool: ToolSpec) {
        let mut binding = self.binding.write();
        if binding.spec.tools.iter().any(|t| t.name == tool.name) {
            return;
        }
        let mut spec = binding.spec.clone();
        spec.tools.push(tool);
        *binding = Arc::new(Binding { spec });
    }

    /// Change the generation temperature. Rebuilds the binding before the
    /// next `execute`; the backend binds temperature at request time.
    pub fn set_temperature(&self, temperature: f64) -> Result<(), EngineError> {
        validate_temperature(temperature)?;
        let mut binding = self.binding.write();
        let mut spec = binding.spec.clone();
        spec.temperature = temperature;
        *binding = Arc::new(Binding { spec });
        Ok(())
    }

    /// Send a fully-rendered prompt to the generation backend.
    ///
    /// Races the call against the cancellation token and the deadline; the
    /// worker never retries — retry policy belongs to the caller.
    pub async fn execute(
        &self,
        prompt: &str,
        deadline: Duration,
        cancel: &CancellationToken,
    ) -> Result<String, BackendError> {
        let binding = Arc::clone(&self.binding.read());
        let request = binding.request(prompt);

        tokio::select! {
            _ = cancel.cancelled() => Err(BackendError::Cancelled),
            result = tokio::time::timeout(deadline, self.backend.complete(&request)) => {
                match result {
                    Ok(inner) => inner,
                    Err(_) => Err(BackendError::Timeout(deadline)),
                }
            }
        }
    }
}

fn validate_temperature(temperature: f64) -> Result<(), EngineError> {
    if (0.0..=1.0).contains(&temperature) {
        Ok(())
    } else {
        Err(EngineError::InvalidTemperature(temperature))
    }
}
