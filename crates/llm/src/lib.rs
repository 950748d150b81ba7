//! Answer-generation backends for DocQA.
//!
//! This crate provides a provider-agnostic abstraction over the backends that
//! turn an assembled prompt into an answer, plus the policy that picks which
//! backend and model a session uses.
//!
//! # Providers
//! - **Anthropic**: remote hosted Messages API
//! - **Ollama**: locally served inference endpoint
//!
//! # Example
//! ```no_run
//! use docqa_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new(Duration::from_secs(60));
//! let request = LlmRequest::new("What is in the report?", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod selector;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, create_clients};
pub use providers::{AnthropicClient, OllamaClient};
pub use selector::{select_backend, select_from_listings, select_model, SelectedBackend};
pub use types::{GenerationParams, ProviderType};
