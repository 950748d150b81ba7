//! Anthropic LLM provider implementation.
//!
//! Remote hosted Messages API: https://docs.anthropic.com/en/api/messages

use super::http::{check_status, transport_error, with_deadline};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docqa_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// Messages API request format.
#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: String,
}

/// Messages API response format.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    model: String,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

/// `/v1/models` response format.
#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    id: String,
}

/// Anthropic LLM client.
pub struct AnthropicClient {
    base_url: String,
    api_key: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl AnthropicClient {
    /// Create a client against the public API.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key, timeout)
    }

    /// Create a client against a custom endpoint (proxy, gateway, test server).
    pub fn with_base_url(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout,
            client: reqwest::Client::new(),
        }
    }

    fn to_messages_request(&self, request: &LlmRequest) -> MessagesRequest {
        MessagesRequest {
            model: request.model.clone(),
            max_tokens: request.params.max_output_tokens,
            system: request.system.clone(),
            messages: vec![Message {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.params.temperature,
            top_p: request.params.top_p,
            top_k: request.params.top_k,
        }
    }

    fn convert_response(&self, response: MessagesResponse) -> LlmResponse {
        let text: Vec<String> = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect();

        let usage = response
            .usage
            .map(|u| LlmUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        LlmResponse {
            content: text.join("").trim().to_string(),
            model: response.model,
            usage,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
    }
}

#[async_trait::async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        let url = format!("{}/v1/models?limit=100", self.base_url);
        tracing::debug!("Listing Anthropic models");

        with_deadline(self.timeout, async {
            let response = self
                .authorized(self.client.get(&url))
                .send()
                .await
                .map_err(|e| transport_error("anthropic", e, self.timeout))?;
            let response = check_status("anthropic", response).await?;
            let list: ModelList = response
                .json()
                .await
                .map_err(|e| transport_error("anthropic", e, self.timeout))?;
            Ok::<_, AppError>(list.data.into_iter().map(|m| m.id).collect())
        })
        .await
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!("Sending completion request to Anthropic (model: {})", request.model);

        let body = self.to_messages_request(request);
        let url = format!("{}/v1/messages", self.base_url);

        let response: MessagesResponse = with_deadline(self.timeout, async {
            let response = self
                .authorized(self.client.post(&url))
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error("anthropic", e, self.timeout))?;
            let response = check_status("anthropic", response).await?;
            response
                .json()
                .await
                .map_err(|e| transport_error("anthropic", e, self.timeout))
        })
        .await?;

        tracing::info!("Received completion from Anthropic");
        Ok(self.convert_response(response))
    }
}
