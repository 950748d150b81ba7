//! Answer types.

use crate::types::Query;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Characters of chunk text kept in an excerpt preview.
pub const PREVIEW_CHARS: usize = 200;

/// A retrieved chunk as shown to the user.
///
/// Internal offsets are hidden; the preview is the start of the chunk text
/// on a single line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedExcerpt {
    /// Source file name (e.g. "report.txt")
    pub document_name: String,

    /// Chunk identifier
    pub chunk_id: String,

    /// Similarity to the question
    pub score: f32,

    /// First characters of the chunk text
    pub preview: String,
}

impl RetrievedExcerpt {
    /// Shorten chunk text to a one-line preview.
    pub fn preview_of(text: &str) -> String {
        let mut preview: String = text
            .chars()
            .take(PREVIEW_CHARS)
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        if text.chars().count() > PREVIEW_CHARS {
            preview.push_str("...");
        }
        preview
    }
}

/// A generated answer and where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text, trimmed
    pub text: String,

    /// Ids of the documents whose excerpts were in the prompt
    pub cited_sources: BTreeSet<String>,

    /// Excerpts included in the prompt, in ranked order
    pub excerpts: Vec<RetrievedExcerpt>,

    /// Model that produced the text
    pub model: String,

    /// Backend that served the model
    pub provider: String,

    /// The question answered
    pub query: Query,
}

impl Answer {
    /// Whether the answer was generated without any excerpt.
    pub fn is_ungrounded(&self) -> bool {
        self.excerpts.is_empty()
    }
}
