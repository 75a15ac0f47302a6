pub mod client;
pub mod error;

pub use client::{ChatCompletionRequest, ChatMessage, LlmClient};
pub use error::{Failure, LlmError};
