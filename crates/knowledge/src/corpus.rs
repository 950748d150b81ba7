//! Indexed corpus snapshots.
//!
//! A snapshot bundles the loaded documents, their chunks and the lexical
//! index built over them. Snapshots are immutable and shared behind an `Arc`;
//! reloading builds a fresh one.

use crate::chunker::chunk_documents;
use crate::index::{IndexOptions, LexicalIndex};
use crate::retriever::retrieve;
use crate::types::{Chunk, CorpusStats, Document, RetrievalResult};
use chrono::{DateTime, Utc};
use docqa_core::{AppError, AppResult, RagConfig};
use std::collections::HashMap;
use std::time::Instant;

/// Documents and chunks addressable by id.
#[derive(Debug, Clone, Default)]
pub struct ChunkStore {
    documents: Vec<Document>,
    chunks: Vec<Chunk>,
    document_positions: HashMap<String, usize>,
    chunk_positions: HashMap<String, usize>,
}

impl ChunkStore {
    /// Create a store.
    ///
    /// # Errors
    /// `AppError::Knowledge` if two documents share an id.
    pub fn new(documents: Vec<Document>, chunks: Vec<Chunk>) -> AppResult<Self> {
        let mut document_positions = HashMap::with_capacity(documents.len());
        for (position, document) in documents.iter().enumerate() {
            if document_positions
                .insert(document.id.clone(), position)
                .is_some()
            {
                return Err(AppError::Knowledge(format!(
                    "Duplicate document id '{}'",
                    document.id
                )));
            }
        }

        let chunk_positions = chunks
            .iter()
            .enumerate()
            .map(|(position, chunk)| (chunk.id.clone(), position))
            .collect();

        Ok(Self {
            documents,
            chunks,
            document_positions,
            chunk_positions,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn document(&self, id: &str) -> Option<&Document> {
        self.document_positions
            .get(id)
            .map(|position| &self.documents[*position])
    }

    pub fn chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunk_positions
            .get(id)
            .map(|position| &self.chunks[*position])
    }

    /// The document a chunk was cut from.
    pub fn document_of(&self, chunk: &Chunk) -> Option<&Document> {
        self.document(&chunk.document_id)
    }
}

/// One indexed generation of the corpus.
#[derive(Debug, Clone)]
pub struct CorpusSnapshot {
    /// Documents and chunks
    pub store: ChunkStore,

    /// Lexical index over `store.chunks()`
    pub index: LexicalIndex,

    /// When the index was built
    pub built_at: DateTime<Utc>,
}

impl CorpusSnapshot {
    /// Rank chunks for a question.
    pub fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        similarity_threshold: f32,
    ) -> RetrievalResult {
        retrieve(&self.index, query, top_k, similarity_threshold)
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            documents: self.store.documents().len(),
            chunks: self.store.chunks().len(),
            vocabulary: self.index.vocabulary().len(),
        }
    }
}

/// Chunk and index a document set.
///
/// This is CPU-bound; async callers run it under `spawn_blocking`.
///
/// # Errors
/// - `AppError::Config` for invalid chunking or vectorizer settings
/// - `AppError::Knowledge` for duplicate document ids
/// - `AppError::EmptyCorpus` when the documents produce no chunk
pub fn build_corpus(documents: Vec<Document>, config: &RagConfig) -> AppResult<CorpusSnapshot> {
    let start = Instant::now();

    let chunks = chunk_documents(&documents, config.chunk_size, config.overlap)?;
    let index = LexicalIndex::build(&chunks, &IndexOptions::from(config))?;
    let store = ChunkStore::new(documents, chunks)?;

    let snapshot = CorpusSnapshot {
        store,
        index,
        built_at: Utc::now(),
    };

    let stats = snapshot.stats();
    tracing::info!(
        "Indexed {} documents into {} chunks ({} terms) in {:.2}s",
        stats.documents,
        stats.chunks,
        stats.vocabulary,
        start.elapsed().as_secs_f64()
    );

    Ok(snapshot)
}
