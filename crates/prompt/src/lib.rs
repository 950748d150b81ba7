//! Grounded prompt construction for DocQA.
//!
//! This crate owns the shape of the prompt sent to a generation backend:
//! - the fixed instruction block that confines answers to the supplied excerpts
//! - the `Prompt` type (instructions, context block, question)
//! - Handlebars rendering into system and user messages

pub mod builder;
pub mod types;

// Re-export main types
pub use builder::{render_prompt, GROUNDING_INSTRUCTIONS, NO_EXCERPTS_NOTICE};
pub use types::{Citation, Prompt, RenderedPrompt};
