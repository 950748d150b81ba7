//! Backend and model selection.
//!
//! Selection runs once when a session starts; the result is cached by the
//! session for every subsequent query.

use crate::client::LlmClient;
use docqa_core::{AppError, AppResult};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;

/// The backend and model a session generates with.
#[derive(Clone)]
pub struct SelectedBackend {
    /// Client for the chosen backend
    pub client: Arc<dyn LlmClient>,

    /// Model identifier as listed by the backend
    pub model: String,
}

impl fmt::Debug for SelectedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedBackend")
            .field("provider", &self.client.provider_name())
            .field("model", &self.model)
            .finish()
    }
}

/// Whether a listed model satisfies a priority entry.
///
/// An untagged entry ("llama3.2") also matches the `:latest` tag that local
/// runtimes append to model names.
fn model_matches(available: &str, wanted: &str) -> bool {
    available == wanted
        || (!wanted.contains(':')
            && available
                .strip_suffix(":latest")
                .is_some_and(|base| base == wanted))
}

/// Pick the first priority entry present in `available`, else any available model.
///
/// Falls back to the first listed model so the choice stays deterministic.
pub fn select_model(available: &[String], priority: &[String]) -> AppResult<String> {
    for wanted in priority {
        if let Some(found) = available.iter().find(|m| model_matches(m, wanted)) {
            return Ok(found.clone());
        }
    }

    available.first().cloned().ok_or_else(|| {
        AppError::NoBackendAvailable("backend lists no models".to_string())
    })
}

/// Select a backend and model across several backends.
///
/// Models are listed from every backend concurrently, then the choice is made
/// by [`select_from_listings`].
pub async fn select_backend(
    backends: &[Arc<dyn LlmClient>],
    priority: &[String],
) -> AppResult<SelectedBackend> {
    if backends.is_empty() {
        return Err(AppError::NoBackendAvailable(
            "no generation backend configured".to_string(),
        ));
    }

    let listings = join_all(backends.iter().map(|b| b.list_models())).await;
    select_from_listings(backends, &listings, priority)
}

/// Select a backend and model from model listings already fetched.
///
/// `listings[i]` is the outcome of listing `backends[i]`. Unreachable
/// backends are skipped. Priority entries are tried in order against the
/// backends in configuration order; if none match, the first model of the
/// first backend that listed anything is used.
pub fn select_from_listings(
    backends: &[Arc<dyn LlmClient>],
    listings: &[AppResult<Vec<String>>],
    priority: &[String],
) -> AppResult<SelectedBackend> {
    if backends.is_empty() {
        return Err(AppError::NoBackendAvailable(
            "no generation backend configured".to_string(),
        ));
    }

    let mut reachable: Vec<(&Arc<dyn LlmClient>, &[String])> = Vec::new();
    let mut failures: Vec<String> = Vec::new();
    for (backend, listing) in backends.iter().zip(listings) {
        match listing {
            Ok(models) if !models.is_empty() => {
                tracing::debug!(
                    "Backend '{}' lists {} model(s)",
                    backend.provider_name(),
                    models.len()
                );
                reachable.push((backend, models.as_slice()));
            }
            Ok(_) => {
                tracing::warn!("Backend '{}' lists no models", backend.provider_name());
                failures.push(format!("{}: no models", backend.provider_name()));
            }
            Err(e) => {
                tracing::warn!("Backend '{}' unavailable: {}", backend.provider_name(), e);
                failures.push(format!("{}: {}", backend.provider_name(), e));
            }
        }
    }

    for wanted in priority {
        for (backend, models) in &reachable {
            if let Some(found) = models.iter().find(|m| model_matches(m, wanted)) {
                tracing::info!(
                    "Selected model '{}' on backend '{}'",
                    found,
                    backend.provider_name()
                );
                return Ok(SelectedBackend {
                    client: Arc::clone(backend),
                    model: found.clone(),
                });
            }
        }
    }

    match reachable.first() {
        Some((backend, models)) => {
            let model = select_model(models, &[])?;
            tracing::info!(
                "No preferred model available; falling back to '{}' on backend '{}'",
                model,
                backend.provider_name()
            );
            Ok(SelectedBackend {
                client: Arc::clone(backend),
                model,
            })
        }
        None => Err(AppError::NoBackendAvailable(failures.join("; "))),
    }
}
