//! Retrieval-augmented answering.
//!
//! Assembles grounded prompts from retrieved chunks, generates answers with
//! the selected backend and manages the session lifecycle around both.

pub mod ask;
pub mod context;
pub mod session;
pub mod types;

pub use ask::answer_query;
pub use context::{assemble, EXCERPT_SEPARATOR};
pub use session::{IndexingHandle, QueryHandle, QuerySession, SessionState};
pub use types::{Answer, RetrievedExcerpt};
