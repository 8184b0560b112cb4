use std::sync::Arc;

use adflow_engine::TaskRunner;
use adflow_store::{AssetStore, SessionRegistry};

/// Shared application state passed to the axum handlers.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub assets: Arc<AssetStore>,
    pub tasks: Arc<TaskRunner>,
}

impl AppState {
    pub fn new(registry: Arc<SessionRegistry>, assets: Arc<AssetStore>) -> Self {
        Self {
            registry,
            assets,
            tasks: Arc::new(TaskRunner::new()),
        }
    }
}
