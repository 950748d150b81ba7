//! DocQA Core Library
//!
//! This crate provides the foundational utilities shared by the DocQA crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (`AppConfig`, `RagConfig`)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, BackendConfig, RagConfig};
pub use error::{AppError, AppResult};
pub use logging::LogFormat;
