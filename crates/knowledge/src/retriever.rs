//! Similarity retrieval over a lexical index.

use crate::index::LexicalIndex;
use crate::types::{RetrievalResult, ScoredChunk};

/// Rank every chunk against `query` and keep the best `top_k` at or above
/// `similarity_threshold`.
///
/// Scores are cosine similarities clamped to `[0, 1]`. Ties rank by ascending
/// chunk order index, then by corpus position. A query sharing no term with
/// the vocabulary yields an empty result.
pub fn retrieve(
    index: &LexicalIndex,
    query: &str,
    top_k: usize,
    similarity_threshold: f32,
) -> RetrievalResult {
    let query_vector = index.project(query);
    if query_vector.iter().all(|w| *w == 0.0) {
        tracing::debug!("Query shares no term with the vocabulary: {:?}", query);
        return RetrievalResult::default();
    }

    let mut scored: Vec<(usize, f32)> = index
        .chunk_vectors()
        .iter()
        .enumerate()
        .map(|(position, vector)| (position, vector.dot_dense(&query_vector).clamp(0.0, 1.0)))
        .collect();

    scored.sort_by(|a, b| {
        b.1.total_cmp(&a.1)
            .then_with(|| index.order_index(a.0).cmp(&index.order_index(b.0)))
            .then_with(|| a.0.cmp(&b.0))
    });

    let entries: Vec<ScoredChunk> = scored
        .into_iter()
        .filter(|(_, score)| *score >= similarity_threshold)
        .take(top_k)
        .map(|(position, score)| ScoredChunk {
            chunk_id: index.chunk_ids()[position].clone(),
            score,
        })
        .collect();

    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        tracing::debug!(
            "Retrieved {} chunks (top score: {:.3}, lowest: {:.3})",
            entries.len(),
            first.score,
            last.score
        );
    } else {
        tracing::debug!(
            "No chunk scored at or above {:.3}",
            similarity_threshold
        );
    }

    RetrievalResult::new(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexOptions;
    use crate::types::Chunk;

    fn chunk(id: &str, order_index: u32, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: id.split('#').next().unwrap_or(id).to_string(),
            text: text.to_string(),
            order_index,
            char_start: 0,
            char_end: text.chars().count(),
        }
    }

    fn index(chunks: &[Chunk]) -> LexicalIndex {
        LexicalIndex::build(chunks, &IndexOptions::default()).unwrap()
    }

    #[test]
    fn test_relevant_chunk_ranks_first() {
        let idx = index(&[
            chunk("weather#0", 0, "Rain and wind expected tomorrow."),
            chunk("finance#0", 0, "Profit depends on pricing and costs."),
        ]);
        let result = retrieve(&idx, "What drives profit?", 5, 0.01);

        assert_eq!(result.len(), 1);
        assert_eq!(result.entries()[0].chunk_id, "finance#0");
        assert!(result.top_score().unwrap() > 0.0);
    }

    #[test]
    fn test_ties_break_by_order_index_then_position() {
        let idx = index(&[
            chunk("b#1", 1, "pricing notes"),
            chunk("a#0", 0, "pricing notes"),
            chunk("c#0", 0, "pricing notes"),
        ]);
        let result = retrieve(&idx, "pricing", 5, 0.0);
        let ids: Vec<&str> = result.entries().iter().map(|e| e.chunk_id.as_str()).collect();
        assert_eq!(ids, vec!["a#0", "c#0", "b#1"]);
    }

    #[test]
    fn test_top_k_and_threshold_respected() {
        let idx = index(&[
            chunk("a#0", 0, "profit profit profit margins"),
            chunk("b#0", 0, "profit and risk"),
            chunk("c#0", 0, "profit forecast with many other unrelated words here"),
            chunk("d#0", 0, "gardening tips"),
        ]);

        let result = retrieve(&idx, "profit", 2, 0.01);
        assert_eq!(result.len(), 2);

        let result = retrieve(&idx, "profit", 10, 0.01);
        assert_eq!(result.len(), 3);
        assert!(result.entries().iter().all(|e| e.score >= 0.01));
        assert!(result.score_of("d#0").is_none());

        let result = retrieve(&idx, "profit", 0, 0.01);
        assert!(result.is_empty());
    }

    #[test]
    fn test_scores_within_unit_interval() {
        let idx = index(&[chunk("a#0", 0, "profit margins"), chunk("b#0", 0, "profit")]);
        let result = retrieve(&idx, "profit margins", 5, 0.0);
        for entry in result.entries() {
            assert!((0.0..=1.0).contains(&entry.score));
        }
        assert!((result.entries()[0].score - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_stop_word_query_yields_empty_result() {
        let idx = index(&[chunk("a#0", 0, "profit margins")]);
        assert!(retrieve(&idx, "what is the", 5, 0.0).is_empty());
        assert!(retrieve(&idx, "", 5, 0.0).is_empty());
    }
}
