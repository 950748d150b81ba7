//! Pipeline-level tests with a scripted generation backend.

mod rag_ranking;

use crate::types::Document;
use docqa_core::{AppError, AppResult, RagConfig};
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, SelectedBackend};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Backend that records requests and answers with a fixed text.
///
/// When gated, `complete` waits until `open()` is called, which lets tests
/// hold a question in flight.
pub(crate) struct MockBackend {
    models: Vec<String>,
    answer: String,
    gate: Option<Arc<Notify>>,
    failure: Option<fn() -> AppError>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockBackend {
    pub(crate) fn new(answer: &str) -> Self {
        Self {
            models: vec!["mock-model".to_string()],
            answer: answer.to_string(),
            gate: None,
            failure: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn gated(answer: &str) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let backend = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::new(answer)
        };
        (backend, gate)
    }

    pub(crate) fn failing(failure: fn() -> AppError) -> Self {
        Self {
            failure: Some(failure),
            ..Self::new("")
        }
    }

    pub(crate) fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockBackend {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn list_models(&self) -> AppResult<Vec<String>> {
        Ok(self.models.clone())
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if let Some(failure) = self.failure {
            return Err(failure());
        }

        Ok(LlmResponse {
            content: format!("  {}\n", self.answer),
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

pub(crate) fn selected(backend: &Arc<MockBackend>) -> SelectedBackend {
    SelectedBackend {
        client: Arc::clone(backend) as Arc<dyn LlmClient>,
        model: "mock-model".to_string(),
    }
}

/// Three short documents: finance, markets and weather.
pub(crate) fn alpha_beta_gamma() -> Vec<Document> {
    vec![
        Document::new(
            "alpha.txt",
            "/docs/alpha.txt",
            "Alpha discusses profit margins and how pricing affects profit.",
        ),
        Document::new(
            "beta.txt",
            "/docs/beta.txt",
            "Beta covers market risk and its effect on quarterly profit.",
        ),
        Document::new(
            "gamma.txt",
            "/docs/gamma.txt",
            "Gamma contains unrelated weather notes about rain and wind.",
        ),
    ]
}

/// Single-chunk-per-document configuration.
pub(crate) fn whole_document_config() -> RagConfig {
    RagConfig {
        chunk_size: 1000,
        overlap: 0,
        ..RagConfig::default()
    }
}
