//! Generation parameter and provider types.

use docqa_core::RagConfig;
use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded to every backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,

    /// Nucleus sampling cutoff
    pub top_p: f32,

    /// Top-k candidate limit
    pub top_k: u32,

    /// Maximum output length in tokens
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for GenerationParams {
    fn from(config: &RagConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k_sampling,
            max_output_tokens: config.max_output_tokens,
        }
    }
}

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    /// Remote hosted API
    Anthropic,
    /// Locally served inference endpoint
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "ollama" | "local" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }

    /// Whether this provider refuses to run without an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Anthropic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("anthropic"), Some(ProviderType::Anthropic));
        assert_eq!(ProviderType::parse("Claude"), Some(ProviderType::Anthropic));
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("local"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("unknown"), None);
    }

    #[test]
    fn test_params_follow_rag_config() {
        let config = RagConfig {
            temperature: 0.7,
            top_k_sampling: 12,
            ..RagConfig::default()
        };
        let params = GenerationParams::from(&config);
        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_k, 12);
        assert_eq!(params.max_output_tokens, 1024);
    }
}
