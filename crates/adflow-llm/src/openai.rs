use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::instrument;

use adflow_core::backend::{CompletionBackend, CompletionRequest};
use adflow_core::errors::BackendError;

const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Chat-completions backend. One non-streaming request per `complete` call;
/// persona, goal, model, temperature and tools are bound per request.
pub struct OpenAiBackend {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiBackend {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the backend at a different base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Build the chat-completions request body for a bound request.
pub fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
    let system = format!("{}\n\nYour goal: {}", request.persona, request.goal);

    let mut body = serde_json::json!({
        "model": request.model,
        "temperature": request.temperature,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": request.prompt},
        ],
    });

    if !request.tools.is_empty() {
        let tools: Vec<serde_json::Value> = request
            .tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": t.parameters_schema,
                    },
                })
            })
            .collect();
        body["tools"] = serde_json::Value::Array(tools);
    }

    body
}

/// Extract the first choice's message content from a chat-completions reply.
fn extract_content(body: &serde_json::Value) -> Result<String, BackendError> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::to_owned)
        .ok_or_else(|| BackendError::Rejected("response carried no message content".into()))
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = build_request_body(request);

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::from_status(status, body));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| BackendError::NetworkError(e.to_string()))?;

        extract_content(&body)
    }
}
