//! Answer orchestration.
//!
//! Retrieves relevant chunks, assembles a grounded prompt and generates the
//! answer with the session's selected backend.

use crate::corpus::CorpusSnapshot;
use crate::rag::context::assemble;
use crate::rag::types::{Answer, RetrievedExcerpt};
use crate::types::{Query, RetrievalResult};
use docqa_core::{AppError, AppResult, RagConfig};
use docqa_llm::{GenerationParams, LlmRequest, SelectedBackend};
use docqa_prompt::{render_prompt, Prompt};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Answer a question against one corpus snapshot.
///
/// Retrieval and assembly run on the blocking pool. An empty retrieval is
/// not an error: the backend still receives the prompt and is instructed to
/// report that the answer is not in the documents.
pub async fn answer_query(
    snapshot: Arc<CorpusSnapshot>,
    backend: &SelectedBackend,
    config: &RagConfig,
    query: Query,
) -> AppResult<Answer> {
    tracing::info!("Answering question: {}", query.text);

    let (prompt, excerpts) = {
        let question = query.text.clone();
        let top_k = config.top_k;
        let threshold = config.similarity_threshold;
        let max_context_chars = config.max_context_chars;

        tokio::task::spawn_blocking(move || {
            let result = snapshot.retrieve(&question, top_k, threshold);
            let prompt = assemble(&result, &snapshot.store, max_context_chars, &question);
            let excerpts = excerpts_for(&prompt, &result, &snapshot);
            (prompt, excerpts)
        })
        .await
        .map_err(|e| AppError::Other(format!("Retrieval task failed: {}", e)))?
    };

    if prompt.has_excerpts() {
        tracing::info!(
            "Using {} excerpts from {} documents",
            prompt.citations.len(),
            prompt.cited_documents().len()
        );
    } else {
        tracing::info!("No relevant excerpts found; asking backend for a not-found answer");
    }

    let rendered = render_prompt(&prompt)?;
    let request = LlmRequest::new(rendered.user, backend.model.clone())
        .with_system(rendered.system)
        .with_params(GenerationParams::from(config));

    let response = backend.client.complete(&request).await?;

    tracing::debug!(
        "Generated {} chars with '{}' ({} tokens)",
        response.content.chars().count(),
        response.model,
        response.usage.total_tokens
    );

    let cited_sources: BTreeSet<String> = prompt
        .citations
        .iter()
        .map(|c| c.document_id.clone())
        .collect();

    Ok(Answer {
        text: response.content.trim().to_string(),
        cited_sources,
        excerpts,
        model: backend.model.clone(),
        provider: backend.client.provider_name().to_string(),
        query,
    })
}

/// Previews of the excerpts that made it into the prompt.
fn excerpts_for(
    prompt: &Prompt,
    result: &RetrievalResult,
    snapshot: &CorpusSnapshot,
) -> Vec<RetrievedExcerpt> {
    prompt
        .citations
        .iter()
        .map(|citation| RetrievedExcerpt {
            document_name: citation.document_name.clone(),
            chunk_id: citation.chunk_id.clone(),
            score: result.score_of(&citation.chunk_id).unwrap_or(0.0),
            preview: snapshot
                .store
                .chunk(&citation.chunk_id)
                .map(|c| RetrievedExcerpt::preview_of(&c.text))
                .unwrap_or_default(),
        })
        .collect()
}
