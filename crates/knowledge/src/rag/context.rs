//! Context assembly.
//!
//! Turns a ranked retrieval result into a grounded prompt: each excerpt is
//! annotated with its source document and the block is capped in characters.

use crate::corpus::ChunkStore;
use crate::types::RetrievalResult;
use docqa_prompt::{Citation, Prompt, GROUNDING_INSTRUCTIONS, NO_EXCERPTS_NOTICE};

/// Separator placed between excerpts.
pub const EXCERPT_SEPARATOR: &str = "\n\n---\n\n";

/// Build the prompt for `question` from ranked excerpts.
///
/// Excerpts are added greedily in ranked order and never truncated; assembly
/// stops at the first one that would push the block past `max_context_chars`
/// (separators included). If nothing fits, the context block is the
/// "no relevant excerpts" notice.
pub fn assemble(
    result: &RetrievalResult,
    store: &ChunkStore,
    max_context_chars: usize,
    question: &str,
) -> Prompt {
    let separator_len = EXCERPT_SEPARATOR.chars().count();

    let mut parts: Vec<String> = Vec::new();
    let mut citations = Vec::new();
    let mut used = 0usize;

    for entry in result.entries() {
        let Some(chunk) = store.chunk(&entry.chunk_id) else {
            tracing::warn!("Retrieved chunk '{}' missing from store", entry.chunk_id);
            continue;
        };
        let document_name = store
            .document_of(chunk)
            .map(|d| d.name())
            .unwrap_or_else(|| chunk.document_id.clone());

        let excerpt = format!("[From: {}]\n{}", document_name, chunk.text);
        let cost = excerpt.chars().count() + if parts.is_empty() { 0 } else { separator_len };
        if used + cost > max_context_chars {
            tracing::debug!(
                "Context budget reached at {} of {} excerpts ({} chars)",
                parts.len(),
                result.len(),
                used
            );
            break;
        }

        used += cost;
        parts.push(excerpt);
        citations.push(Citation {
            document_id: chunk.document_id.clone(),
            document_name,
            chunk_id: chunk.id.clone(),
        });
    }

    let context_block = if parts.is_empty() {
        NO_EXCERPTS_NOTICE.to_string()
    } else {
        parts.join(EXCERPT_SEPARATOR)
    };

    Prompt {
        instructions: GROUNDING_INSTRUCTIONS.to_string(),
        context_block,
        question: question.to_string(),
        citations,
    }
}
