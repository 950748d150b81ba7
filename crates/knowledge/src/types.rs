//! Knowledge system type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A loaded source document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique document identifier
    pub id: String,

    /// Where the text came from
    pub source_path: PathBuf,

    /// Extracted text
    pub raw_text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(
        id: impl Into<String>,
        source_path: impl Into<PathBuf>,
        raw_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_path: source_path.into(),
            raw_text: raw_text.into(),
        }
    }

    /// Short display name: the file name of the source path, else the id.
    pub fn name(&self) -> String {
        file_name(&self.source_path).unwrap_or_else(|| self.id.clone())
    }

    /// Length of the text in characters.
    pub fn char_len(&self) -> usize {
        self.raw_text.chars().count()
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// A contiguous span of a document's text.
///
/// Offsets count characters, not bytes, and are half-open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk identifier (`<document_id>#<order_index>`)
    pub id: String,

    /// Source document ID
    pub document_id: String,

    /// Text content (never empty)
    pub text: String,

    /// Position within the source document
    pub order_index: u32,

    /// First character covered
    pub char_start: usize,

    /// One past the last character covered
    pub char_end: usize,
}

impl Chunk {
    /// Number of characters covered.
    pub fn char_len(&self) -> usize {
        self.char_end - self.char_start
    }
}

/// A chunk paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// Chunk identifier
    pub chunk_id: String,

    /// Cosine similarity in [0, 1]
    pub score: f32,
}

/// Ranked retrieval output: descending score, at most `top_k` entries, all
/// at or above the similarity threshold. May be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    entries: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub(crate) fn new(entries: Vec<ScoredChunk>) -> Self {
        Self { entries }
    }

    /// Ranked entries.
    pub fn entries(&self) -> &[ScoredChunk] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Highest score, if any entry was kept.
    pub fn top_score(&self) -> Option<f32> {
        self.entries.first().map(|e| e.score)
    }

    /// Score of a given chunk, if it was retrieved.
    pub fn score_of(&self, chunk_id: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|e| e.chunk_id == chunk_id)
            .map(|e| e.score)
    }
}

/// A question as issued by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Question text
    pub text: String,

    /// When the question was asked
    pub issued_at: DateTime<Utc>,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            issued_at: Utc::now(),
        }
    }
}

/// Size of the currently indexed corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorpusStats {
    /// Number of documents
    pub documents: usize,

    /// Number of chunks
    pub chunks: usize,

    /// Number of vocabulary terms
    pub vocabulary: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_name_uses_file_name() {
        let doc = Document::new("reports/q3.txt", "/data/reports/q3.txt", "text");
        assert_eq!(doc.name(), "q3.txt");

        let doc = Document::new("inline-1", "", "text");
        assert_eq!(doc.name(), "inline-1");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let doc = Document::new("d", "d.txt", "héllo");
        assert_eq!(doc.char_len(), 5);
    }
}
