//! Concrete generation backends.

pub mod anthropic;
mod http;
pub mod ollama;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
