pub mod openai;
pub mod search;

pub mod mock;

pub use mock::{MockBackend, MockReply};
pub use openai::OpenAiBackend;
