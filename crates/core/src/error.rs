//! Error types for DocQA.
//!
//! This module defines a unified error enum covering every failure the
//! answering pipeline can surface: configuration, corpus, session, and
//! generation backend errors, plus the ambient I/O and serialization cases.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for DocQA.
///
/// All fallible functions return `Result<T, AppError>`. Backend failures keep
/// enough structure (`RateLimited::retry_after`, `is_retryable`) for the
/// caller to decide on a retry; nothing in the pipeline retries on its own.
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid configuration (chunking, retrieval or generation settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// An index was requested over zero chunks
    #[error("Cannot build an index over an empty corpus")]
    EmptyCorpus,

    /// No generation backend reachable or no model listed
    #[error("No generation backend available: {0}")]
    NoBackendAvailable(String),

    /// A query is already in flight (or an index build is running)
    #[error("Session busy: {0}")]
    SessionBusy(String),

    /// The session has no index to query yet
    #[error("Session not ready: {0}")]
    NotReady(String),

    /// Transport or connection failure talking to a backend
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Backend-reported throttling or quota exhaustion
    #[error("Rate limited: {message}{}", format_retry_after(.retry_after))]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    /// Generation deadline exceeded
    #[error("Generation timed out after {}s", .0.as_secs_f64())]
    GenerationTimeout(Duration),

    /// The query was cancelled before an answer arrived
    #[error("Query cancelled")]
    Cancelled,

    /// Other LLM backend errors (bad status, malformed response)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Knowledge pipeline errors (document loading, snapshot access)
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// Prompt rendering errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

fn format_retry_after(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(" (retry after {}s)", d.as_secs()),
        None => String::new(),
    }
}

impl AppError {
    /// Whether the caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::BackendUnavailable(_)
                | AppError::RateLimited { .. }
                | AppError::GenerationTimeout(_)
                | AppError::SessionBusy(_)
        )
    }

    /// Retry hint reported by the backend, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
