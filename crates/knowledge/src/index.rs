//! Lexical term-frequency index over chunks.
//!
//! Every chunk becomes a sparse, L2-normalized term-frequency vector over a
//! vocabulary capped at `max_features` terms. The index is a pure function of
//! its chunk set and is never updated in place; a reload builds a new one.

use crate::tokenize::Tokenizer;
use crate::types::Chunk;
use docqa_core::{AppError, AppResult, RagConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters of the vectorizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexOptions {
    /// Vocabulary cap
    pub max_features: usize,

    /// Inclusive n-gram range
    pub ngram_range: (usize, usize),

    /// Use `1 + ln(tf)` instead of raw counts
    pub sublinear_tf: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for IndexOptions {
    fn from(config: &RagConfig) -> Self {
        Self {
            max_features: config.max_features,
            ngram_range: config.ngram_range,
            sublinear_tf: config.sublinear_tf,
        }
    }
}

/// Sparse vector of `(column, weight)` pairs sorted by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    entries: Vec<(u32, f32)>,
}

impl SparseVector {
    /// Build a normalized vector from per-column weights.
    fn normalized(mut entries: Vec<(u32, f32)>) -> Self {
        entries.sort_by_key(|(column, _)| *column);
        let norm = entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }
        Self { entries }
    }

    /// Non-zero entries.
    pub fn entries(&self) -> &[(u32, f32)] {
        &self.entries
    }

    /// True when no vocabulary term occurs.
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Euclidean length (1 for any non-zero vector).
    pub fn norm(&self) -> f32 {
        self.entries.iter().map(|(_, w)| w * w).sum::<f32>().sqrt()
    }

    /// Dot product against a dense vector indexed by column.
    pub fn dot_dense(&self, dense: &[f32]) -> f32 {
        self.entries
            .iter()
            .filter_map(|(column, w)| dense.get(*column as usize).map(|d| d * w))
            .sum()
    }
}

/// Immutable term-frequency index.
#[derive(Debug, Clone)]
pub struct LexicalIndex {
    tokenizer: Tokenizer,
    sublinear_tf: bool,
    vocabulary: HashMap<String, u32>,
    chunk_ids: Vec<String>,
    order_indices: Vec<u32>,
    chunk_vectors: Vec<SparseVector>,
}

impl LexicalIndex {
    /// Fit the vocabulary on `chunks` and vectorize every chunk.
    ///
    /// # Errors
    /// `AppError::EmptyCorpus` when `chunks` is empty, `AppError::Config` when
    /// `max_features` is zero.
    pub fn build(chunks: &[Chunk], options: &IndexOptions) -> AppResult<Self> {
        if chunks.is_empty() {
            return Err(AppError::EmptyCorpus);
        }
        if options.max_features == 0 {
            return Err(AppError::Config(
                "max_features must be at least 1".to_string(),
            ));
        }

        let tokenizer = Tokenizer::new(options.ngram_range);
        let chunk_counts: Vec<HashMap<String, u32>> = chunks
            .iter()
            .map(|chunk| tokenizer.term_counts(&chunk.text))
            .collect();

        let vocabulary = fit_vocabulary(&chunk_counts, options.max_features);

        let chunk_vectors = chunk_counts
            .iter()
            .map(|counts| vectorize(counts, &vocabulary, options.sublinear_tf))
            .collect::<Vec<_>>();

        let empty = chunk_vectors.iter().filter(|v| v.is_zero()).count();
        tracing::debug!(
            "Built lexical index: {} chunks, {} terms, {} chunks without vocabulary terms",
            chunks.len(),
            vocabulary.len(),
            empty
        );

        Ok(Self {
            tokenizer,
            sublinear_tf: options.sublinear_tf,
            vocabulary,
            chunk_ids: chunks.iter().map(|c| c.id.clone()).collect(),
            order_indices: chunks.iter().map(|c| c.order_index).collect(),
            chunk_vectors,
        })
    }

    /// Project text into the index space as a dense, normalized vector.
    ///
    /// Out-of-vocabulary terms are ignored; text with no known term yields the
    /// zero vector.
    pub fn project(&self, text: &str) -> Vec<f32> {
        let counts = self.tokenizer.term_counts(text);
        let sparse = vectorize(&counts, &self.vocabulary, self.sublinear_tf);

        let mut dense = vec![0.0; self.vocabulary.len()];
        for (column, weight) in sparse.entries() {
            dense[*column as usize] = *weight;
        }
        dense
    }

    /// Term to column mapping.
    pub fn vocabulary(&self) -> &HashMap<String, u32> {
        &self.vocabulary
    }

    /// Retained terms in column order.
    pub fn terms(&self) -> Vec<&str> {
        let mut terms: Vec<(&str, u32)> = self
            .vocabulary
            .iter()
            .map(|(term, column)| (term.as_str(), *column))
            .collect();
        terms.sort_by_key(|(_, column)| *column);
        terms.into_iter().map(|(term, _)| term).collect()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunk_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunk_ids.is_empty()
    }

    /// Chunk ids in corpus order.
    pub fn chunk_ids(&self) -> &[String] {
        &self.chunk_ids
    }

    /// Chunk vectors in corpus order.
    pub fn chunk_vectors(&self) -> &[SparseVector] {
        &self.chunk_vectors
    }

    /// Order index of the chunk at corpus position `position`.
    pub fn order_index(&self, position: usize) -> u32 {
        self.order_indices.get(position).copied().unwrap_or(u32::MAX)
    }
}

/// Keep the `max_features` most frequent terms (ties alphabetical), then
/// number the survivors alphabetically.
fn fit_vocabulary(
    chunk_counts: &[HashMap<String, u32>],
    max_features: usize,
) -> HashMap<String, u32> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for counts in chunk_counts {
        for (term, count) in counts {
            *totals.entry(term.as_str()).or_insert(0) += u64::from(*count);
        }
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_features);

    let mut kept: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
    kept.sort_unstable();

    kept.into_iter()
        .enumerate()
        .map(|(column, term)| (term.to_string(), column as u32))
        .collect()
}

fn vectorize(
    counts: &HashMap<String, u32>,
    vocabulary: &HashMap<String, u32>,
    sublinear_tf: bool,
) -> SparseVector {
    let entries = counts
        .iter()
        .filter_map(|(term, count)| {
            vocabulary
                .get(term)
                .map(|column| (*column, term_weight(*count, sublinear_tf)))
        })
        .collect();
    SparseVector::normalized(entries)
}

fn term_weight(count: u32, sublinear_tf: bool) -> f32 {
    if sublinear_tf {
        1.0 + (count as f32).ln()
    } else {
        count as f32
    }
}
