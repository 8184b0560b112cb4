pub mod assets;
pub mod error;
pub mod history;
pub mod registry;

pub use assets::{Asset, AssetStore};
pub use error::StoreError;
pub use history::HistoryLog;
pub use registry::{Session, SessionRegistry};
