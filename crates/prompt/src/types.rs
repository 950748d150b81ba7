//! Prompt types.

use serde::{Deserialize, Serialize};

/// One excerpt included in a prompt's context block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// Identifier of the source document
    pub document_id: String,

    /// Display name used in the `[From: ...]` annotation
    pub document_name: String,

    /// Identifier of the chunk whose text was included
    pub chunk_id: String,
}

/// A grounded generation request before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Fixed instruction block
    pub instructions: String,

    /// Cited excerpts, in ranked order, each annotated with its source name
    pub context_block: String,

    /// The user's question
    pub question: String,

    /// Excerpts present in the context block, in the same order
    pub citations: Vec<Citation>,
}

impl Prompt {
    /// Whether any excerpt was included.
    pub fn has_excerpts(&self) -> bool {
        !self.citations.is_empty()
    }

    /// Distinct cited document ids, in order of first appearance.
    pub fn cited_documents(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for citation in &self.citations {
            if !seen.contains(&citation.document_id.as_str()) {
                seen.push(&citation.document_id);
            }
        }
        seen
    }
}

/// A prompt rendered into chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedPrompt {
    /// System message: instructions followed by the excerpts
    pub system: String,

    /// User message: the question
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn citation(document_id: &str, chunk_id: &str) -> Citation {
        Citation {
            document_id: document_id.to_string(),
            document_name: document_id.to_string(),
            chunk_id: chunk_id.to_string(),
        }
    }

    #[test]
    fn test_cited_documents_are_distinct_and_ordered() {
        let prompt = Prompt {
            instructions: String::new(),
            context_block: String::new(),
            question: "q".to_string(),
            citations: vec![
                citation("beta.txt", "beta.txt#2"),
                citation("alpha.txt", "alpha.txt#0"),
                citation("beta.txt", "beta.txt#0"),
            ],
        };

        assert!(prompt.has_excerpts());
        assert_eq!(prompt.cited_documents(), vec!["beta.txt", "alpha.txt"]);
    }
}
