use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use adflow_engine::OrchestratorConfig;
use adflow_llm::OpenAiBackend;
use adflow_server::{AppState, ServerConfig};
use adflow_store::{AssetStore, SessionRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting adflow server");

    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY is not set"))?;
    let backend = Arc::new(OpenAiBackend::new(SecretString::from(api_key)));

    let orchestrator_config = OrchestratorConfig {
        model: env_or("ADFLOW_MODEL", "gpt-4o-mini"),
        stage_deadline: Duration::from_secs(env_parsed("ADFLOW_STAGE_DEADLINE_SECS", 120)),
    };
    let registry = Arc::new(SessionRegistry::new(backend, orchestrator_config));

    let upload_dir = env_or("ADFLOW_UPLOAD_DIR", "uploads");
    let assets = Arc::new(AssetStore::new(&upload_dir)?);
    tracing::info!(path = %upload_dir, "asset store ready");

    let state = Arc::new(AppState::new(registry, assets));

    let config = ServerConfig {
        port: env_parsed("ADFLOW_PORT", 8000),
        session_max_idle: Duration::from_secs(env_parsed("ADFLOW_SESSION_IDLE_SECS", 3600)),
        eviction_interval: Duration::from_secs(env_parsed("ADFLOW_EVICTION_INTERVAL_SECS", 60)),
        ..Default::default()
    };
    let handle = adflow_server::start(config, state).await?;
    tracing::info!(port = handle.port, "adflow server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down");
    Ok(())
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
