//! LLM provider factory.
//!
//! Builds generation clients from provider names and backend configuration,
//! resolving API keys from the environment.

use crate::client::LlmClient;
use crate::providers::{AnthropicClient, OllamaClient};
use crate::types::ProviderType;
use docqa_core::{AppError, AppResult, BackendConfig};
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("anthropic", "claude", "ollama", "local")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key (required by the remote provider)
/// * `timeout` - Deadline for each request
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    match provider_type {
        ProviderType::Ollama => {
            let client = match endpoint {
                Some(url) => OllamaClient::with_base_url(url, timeout),
                None => OllamaClient::new(timeout),
            };
            Ok(Arc::new(client))
        }
        ProviderType::Anthropic => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("Anthropic provider requires API key".to_string())
            })?;
            let client = match endpoint {
                Some(url) => AnthropicClient::with_base_url(url, api_key, timeout),
                None => AnthropicClient::new(api_key, timeout),
            };
            Ok(Arc::new(client))
        }
    }
}

/// Create clients for every usable configured backend, in configuration order.
///
/// Backends that cannot be constructed (unknown provider, missing key) are
/// skipped with a warning; selection later fails with `NoBackendAvailable`
/// if nothing usable remains.
pub fn create_clients(backends: &[BackendConfig], timeout: Duration) -> Vec<Arc<dyn LlmClient>> {
    backends
        .iter()
        .filter_map(|backend| {
            let api_key = backend.resolve_api_key();
            match create_client(
                &backend.provider,
                backend.endpoint.as_deref(),
                api_key.as_deref(),
                timeout,
            ) {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::warn!("Skipping backend '{}': {}", backend.provider, e);
                    None
                }
            }
        })
        .collect()
}
