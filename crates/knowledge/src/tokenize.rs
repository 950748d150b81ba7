//! Term extraction for the lexical index.
//!
//! Text is split on Unicode word boundaries, lowercased, stripped of
//! single-character tokens and English stop words, then expanded into
//! n-grams over the remaining token stream.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "almost", "also", "am", "among",
    "an", "and", "any", "are", "as", "at", "be", "because", "been", "before", "being", "below",
    "between", "both", "but", "by", "can", "cannot", "could", "did", "do", "does", "doing",
    "done", "down", "during", "each", "either", "else", "enough", "etc", "even", "ever",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in",
    "into", "is", "it", "its", "itself", "just", "least", "less", "let", "many", "may", "me",
    "might", "more", "most", "much", "must", "my", "myself", "neither", "never", "no", "nor",
    "not", "now", "of", "off", "often", "on", "once", "only", "or", "other", "others", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "per", "perhaps", "rather", "same",
    "several", "shall", "she", "should", "since", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "though", "through", "thus", "to", "too", "under", "until", "up", "upon", "us", "very",
    "via", "was", "we", "well", "were", "what", "whatever", "when", "whenever", "where",
    "whereas", "whether", "which", "while", "who", "whoever", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself",
    "yourselves",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Whether `word` (already lowercased) is ignored during indexing.
pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Turns text into index terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    min_n: usize,
    max_n: usize,
}

impl Tokenizer {
    /// Create a tokenizer for the inclusive n-gram range `(min_n, max_n)`.
    ///
    /// The range is expected to be validated already (`1 <= min_n <= max_n`).
    pub fn new(ngram_range: (usize, usize)) -> Self {
        let (min_n, max_n) = ngram_range;
        let min_n = min_n.max(1);
        Self {
            min_n,
            max_n: max_n.max(min_n),
        }
    }

    /// Lowercased content words in text order.
    pub fn words(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() >= 2 && !is_stop_word(w))
            .collect()
    }

    /// All n-gram terms in text order; n-grams are joined with a single space.
    pub fn terms(&self, text: &str) -> Vec<String> {
        let words = self.words(text);
        let mut terms = Vec::new();
        for n in self.min_n..=self.max_n {
            if n == 1 {
                terms.extend(words.iter().cloned());
            } else {
                terms.extend(words.windows(n).map(|w| w.join(" ")));
            }
        }
        terms
    }

    /// Occurrence count per term.
    pub fn term_counts(&self, text: &str) -> HashMap<String, u32> {
        let mut counts = HashMap::new();
        for term in self.terms(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new((1, 2))
    }
}
