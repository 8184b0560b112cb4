use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use adflow_core::backend::{CompletionBackend, CompletionRequest};
use adflow_core::errors::BackendError;

/// Pre-programmed replies for deterministic testing without API calls.
pub enum MockReply {
    /// Return this text.
    Text(String),
    /// Fail the call.
    Fail(BackendError),
    /// Wait a duration, then resolve the inner reply.
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(text: &str) -> Self {
        Self::Text(text.to_string())
    }

    pub fn delayed(delay: Duration, inner: MockReply) -> Self {
        Self::Delayed(delay, Box::new(inner))
    }
}

/// Mock backend that serves pre-programmed replies in call order and records
/// every request it receives, so tests can inspect rendered prompts.
pub struct MockBackend {
    replies: Vec<MockReply>,
    call_count: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            call_count: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        self.requests.lock().push(request.clone());
        let idx = self.call_count.fetch_add(1, Ordering::Relaxed);

        let Some(reply) = self.replies.get(idx) else {
            return Err(BackendError::Rejected(format!(
                "MockBackend: no reply configured for call {idx}"
            )));
        };

        let mut current = reply;
        loop {
            match current {
                MockReply::Text(text) => return Ok(text.clone()),
                MockReply::Fail(e) => return Err(e.clone()),
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(*delay).await;
                    current = inner.as_ref();
                }
            }
        }
    }
}
