pub mod error;
pub mod handlers;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::{build_router, start, ServerConfig, ServerHandle};
pub use state::AppState;
