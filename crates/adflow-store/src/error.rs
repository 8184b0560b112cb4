#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("asset not found: {0}")]
    AssetNotFound(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
