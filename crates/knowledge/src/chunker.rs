//! Text chunking with configurable size and overlap.

use crate::types::{Chunk, Document};
use docqa_core::{AppError, AppResult};

/// Split a document into overlapping fixed-size character windows.
///
/// The window advances by `chunk_size - overlap` characters; the last window
/// is clamped to the end of the text. An empty document yields no chunks.
///
/// # Errors
/// `AppError::Config` unless `0 <= overlap < chunk_size`.
pub fn chunk_document(
    document: &Document,
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(AppError::Config(format!(
            "invalid chunking: overlap ({}) must be smaller than chunk_size ({})",
            overlap, chunk_size
        )));
    }

    let text = document.raw_text.as_str();

    // Byte offset of every character, so windows never split a code point
    let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let total = offsets.len();
    let byte_at = |char_pos: usize| offsets.get(char_pos).copied().unwrap_or(text.len());

    let step = chunk_size - overlap;
    let mut chunks = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    let mut order_index = 0u32;

    while start < total {
        let end = (start + chunk_size).min(total);

        chunks.push(Chunk {
            id: format!("{}#{}", document.id, order_index),
            document_id: document.id.clone(),
            text: text[byte_at(start)..byte_at(end)].to_string(),
            order_index,
            char_start: start,
            char_end: end,
        });

        order_index += 1;
        start += step;
    }

    tracing::debug!(
        "Chunked '{}' into {} chunks (size: {}, overlap: {})",
        document.id,
        chunks.len(),
        chunk_size,
        overlap
    );

    Ok(chunks)
}

/// Chunk every document, preserving document order.
pub fn chunk_documents(
    documents: &[Document],
    chunk_size: usize,
    overlap: usize,
) -> AppResult<Vec<Chunk>> {
    let mut all = Vec::new();
    for document in documents {
        all.extend(chunk_document(document, chunk_size, overlap)?);
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::new("doc", "doc.txt", text)
    }

    /// Characters shared by two half-open spans.
    fn shared(a: &Chunk, b: &Chunk) -> usize {
        a.char_end.saturating_sub(b.char_start).min(b.char_len())
    }

    #[test]
    fn test_chunk_text_basic() {
        let chunks = chunk_document(&doc(&"a".repeat(1000)), 200, 50).unwrap();

        assert_eq!(chunks.len(), 7);
        assert_eq!(chunks[0].order_index, 0);
        assert_eq!(chunks[1].order_index, 1);
        assert_eq!(chunks[0].id, "doc#0");
        assert_eq!((chunks[1].char_start, chunks[1].char_end), (150, 350));
    }

    #[test]
    fn test_chunk_text_no_overlap() {
        let chunks = chunk_document(&doc(&"a".repeat(300)), 100, 0).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[2].char_end, 300);
    }

    #[test]
    fn test_chunk_text_empty() {
        let chunks = chunk_document(&doc(""), 100, 10).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_invalid_overlap_rejected() {
        assert!(matches!(
            chunk_document(&doc("abc"), 10, 10),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            chunk_document(&doc("abc"), 0, 0),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_spans_cover_document_without_gaps() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(23);
        let total = text.chars().count();

        for (size, overlap) in [(50, 10), (64, 0), (7, 6), (1000, 0), (100, 99)] {
            let chunks = chunk_document(&doc(&text), size, overlap).unwrap();
            assert_eq!(chunks.first().unwrap().char_start, 0);
            assert_eq!(chunks.last().unwrap().char_end, total);
            for pair in chunks.windows(2) {
                assert!(pair[1].char_start <= pair[0].char_end, "gap at {size}/{overlap}");
                assert!(pair[1].order_index > pair[0].order_index);
            }
            for chunk in &chunks {
                assert!(!chunk.text.is_empty());
                assert!(chunk.char_len() <= size);
            }
        }
    }

    #[test]
    fn test_overlap_is_clamped_at_document_end() {
        // 120 chars, size 50, overlap 20 -> starts 0, 30, 60, 90
        let text = "x".repeat(120);
        let chunks = chunk_document(&doc(&text), 50, 20).unwrap();
        assert_eq!(chunks.len(), 4);

        for pair in chunks.windows(2) {
            let remaining = pair[1].char_len();
            assert_eq!(shared(&pair[0], &pair[1]), 20.min(remaining));
        }
        assert_eq!((chunks[3].char_start, chunks[3].char_end), (90, 120));
    }

    #[test]
    fn test_multibyte_text_is_split_on_characters() {
        let text = "naïve café über straße ".repeat(5);
        let chunks = chunk_document(&doc(&text), 10, 3).unwrap();

        let chars: Vec<char> = text.chars().collect();
        for chunk in &chunks {
            let expected: String = chars[chunk.char_start..chunk.char_end].iter().collect();
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "Alpha discusses profit margins. ".repeat(40);
        let first = chunk_document(&doc(&text), 90, 15).unwrap();
        let second = chunk_document(&doc(&text), 90, 15).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_chunk_documents_keeps_document_order() {
        let docs = vec![
            Document::new("a", "a.txt", "a".repeat(30)),
            Document::new("b", "b.txt", ""),
            Document::new("c", "c.txt", "c".repeat(10)),
        ];
        let chunks = chunk_documents(&docs, 20, 0).unwrap();
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a#0", "a#1", "c#0"]);
    }
}
