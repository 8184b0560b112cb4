use async_trait::async_trait;

use crate::errors::BackendError;
use crate::tools::ToolSpec;

/// A fully-bound generation request.
///
/// The prompt already contains any upstream context the caller chose to
/// splice in; the backend binds persona, goal, model, temperature and tools
/// at request time.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub persona: String,
    pub goal: String,
    pub prompt: String,
    pub model: String,
    pub temperature: f64,
    pub tools: Vec<ToolSpec>,
}

/// Trait implemented by each generation backend.
///
/// `complete` is a single blocking network round trip from the caller's
/// point of view; suspension off the request path happens in the task
/// runner, not here.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}
