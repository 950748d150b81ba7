//! Document question answering over a local folder.
//!
//! Documents are split into overlapping character chunks, indexed with a
//! lexical term-frequency vectorizer and ranked by cosine similarity. The
//! best chunks are assembled into a grounded prompt and answered by the
//! backend selected when the session started.

pub mod chunker;
pub mod corpus;
pub mod index;
pub mod rag;
pub mod retriever;
pub mod source;
pub mod tokenize;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{chunk_document, chunk_documents};
pub use corpus::{build_corpus, ChunkStore, CorpusSnapshot};
pub use index::{IndexOptions, LexicalIndex, SparseVector};
pub use rag::{Answer, IndexingHandle, QueryHandle, QuerySession, RetrievedExcerpt, SessionState};
pub use retriever::retrieve;
pub use source::FolderSource;
pub use tokenize::Tokenizer;
pub use types::{Chunk, CorpusStats, Document, Query, RetrievalResult, ScoredChunk};
