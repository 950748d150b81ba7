//! Query session controller.
//!
//! A session owns the current corpus snapshot and the backend chosen when it
//! started. Indexing and answering run in the background; callers get a
//! handle back immediately and await it when they need the outcome.
//!
//! At most one question is answered at a time. A reload may run while a
//! question is in flight: the question keeps the snapshot it started with.

use crate::corpus::{build_corpus, CorpusSnapshot};
use crate::rag::ask::answer_query;
use crate::rag::types::Answer;
use crate::types::{CorpusStats, Document, Query};
use docqa_core::{AppError, AppResult, RagConfig};
use docqa_llm::{select_backend, LlmClient, SelectedBackend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use uuid::Uuid;

/// Observable lifecycle of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    /// Nothing indexed
    Idle,
    /// Documents are being chunked and indexed
    Indexing,
    /// A snapshot is available and no question is in flight
    Ready,
    /// A question is being answered
    Querying,
    /// The last indexing run failed
    Error(String),
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Indexing => write!(f, "indexing"),
            Self::Ready => write!(f, "ready"),
            Self::Querying => write!(f, "querying"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

struct InFlight {
    id: Uuid,
    abort: AbortHandle,
}

#[derive(Default)]
struct Shared {
    snapshot: Option<Arc<CorpusSnapshot>>,
    indexing: bool,
    failure: Option<String>,
    in_flight: Option<InFlight>,
    /// Bumped by every load and clear; stale index builds are discarded
    generation: u64,
}

fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clear the in-flight slot if it still belongs to `id`.
///
/// Returns false when the query was cancelled in the meantime.
fn release(shared: &Mutex<Shared>, id: Uuid) -> bool {
    let mut state = lock(shared);
    match &state.in_flight {
        Some(current) if current.id == id => {
            state.in_flight = None;
            true
        }
        _ => false,
    }
}

/// Owns the in-flight slot and the reply channel of one question.
///
/// Dropped without `complete` (abort or panic), it still releases the slot.
/// A panic is reported to the waiter as an error; only `cancel` resolves a
/// question as `AppError::Cancelled`.
struct InFlightGuard {
    shared: Arc<Mutex<Shared>>,
    id: Uuid,
    sender: Option<oneshot::Sender<AppResult<Answer>>>,
}

impl InFlightGuard {
    fn complete(mut self, result: AppResult<Answer>) {
        let sender = self.sender.take();
        if !release(&self.shared, self.id) {
            tracing::debug!("Dropping answer to cancelled question {}", self.id);
            return;
        }
        if let Some(sender) = sender {
            let _ = sender.send(result);
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let owned = release(&self.shared, self.id);
        let Some(sender) = self.sender.take() else {
            return;
        };
        if owned && std::thread::panicking() {
            tracing::error!("Answering task for question {} panicked", self.id);
            let _ = sender.send(Err(AppError::Other(
                "answering task panicked".to_string(),
            )));
        }
    }
}

/// Pending answer to one question.
#[derive(Debug)]
pub struct QueryHandle {
    id: Uuid,
    receiver: oneshot::Receiver<AppResult<Answer>>,
}

impl QueryHandle {
    /// Identifier of the question.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Wait for the answer.
    ///
    /// Resolves to `AppError::Cancelled` if the question was cancelled or
    /// the session was dropped, and to `AppError::Other` if answering panicked.
    pub async fn wait(self) -> AppResult<Answer> {
        self.receiver.await.unwrap_or(Err(AppError::Cancelled))
    }
}

/// Pending indexing run.
#[derive(Debug)]
pub struct IndexingHandle {
    receiver: oneshot::Receiver<AppResult<CorpusStats>>,
}

impl IndexingHandle {
    /// Wait for the index to be built.
    ///
    /// Resolves to `AppError::Cancelled` if the session was cleared before
    /// the run finished.
    pub async fn wait(self) -> AppResult<CorpusStats> {
        self.receiver.await.unwrap_or(Err(AppError::Cancelled))
    }
}

/// A question-answering session over one document set at a time.
pub struct QuerySession {
    config: Arc<RagConfig>,
    backend: SelectedBackend,
    shared: Arc<Mutex<Shared>>,
}

impl fmt::Debug for QuerySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuerySession")
            .field("backend", &self.backend)
            .field("state", &self.state())
            .finish()
    }
}

impl QuerySession {
    /// Validate `config`, select a backend and model, and start an idle session.
    ///
    /// Selection happens once; every question in the session uses the result.
    ///
    /// # Errors
    /// - `AppError::Config` for invalid settings
    /// - `AppError::NoBackendAvailable` when no backend lists a model
    pub async fn start(config: RagConfig, backends: &[Arc<dyn LlmClient>]) -> AppResult<Self> {
        config.validate()?;
        let backend = select_backend(backends, &config.model_priority_list).await?;
        Self::with_backend(config, backend)
    }

    /// Start a session on an already selected backend.
    pub fn with_backend(config: RagConfig, backend: SelectedBackend) -> AppResult<Self> {
        config.validate()?;
        tracing::info!(
            "Session started with model '{}' on '{}'",
            backend.model,
            backend.client.provider_name()
        );
        Ok(Self {
            config: Arc::new(config),
            backend,
            shared: Arc::new(Mutex::new(Shared::default())),
        })
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    pub fn backend(&self) -> &SelectedBackend {
        &self.backend
    }

    /// Model used for every answer in this session.
    pub fn selected_model(&self) -> &str {
        &self.backend.model
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        let shared = lock(&self.shared);
        if shared.indexing {
            SessionState::Indexing
        } else if shared.in_flight.is_some() {
            SessionState::Querying
        } else if let Some(message) = &shared.failure {
            SessionState::Error(message.clone())
        } else if shared.snapshot.is_some() {
            SessionState::Ready
        } else {
            SessionState::Idle
        }
    }

    /// Size of the current snapshot; zero when nothing is indexed.
    pub fn stats(&self) -> CorpusStats {
        lock(&self.shared)
            .snapshot
            .as_ref()
            .map(|s| s.stats())
            .unwrap_or_default()
    }

    /// Current snapshot, if any.
    pub fn snapshot(&self) -> Option<Arc<CorpusSnapshot>> {
        lock(&self.shared).snapshot.clone()
    }

    /// Chunk and index `documents` in the background.
    ///
    /// On success the new snapshot replaces the old one; on failure the old
    /// snapshot is dropped and the session reports `SessionState::Error`.
    ///
    /// # Errors
    /// `AppError::SessionBusy` while another load is running.
    pub fn load(&self, documents: Vec<Document>) -> AppResult<IndexingHandle> {
        let generation = {
            let mut shared = lock(&self.shared);
            if shared.indexing {
                return Err(AppError::SessionBusy(
                    "documents are already being indexed".to_string(),
                ));
            }
            shared.indexing = true;
            shared.generation += 1;
            shared.generation
        };

        tracing::info!("Indexing {} documents", documents.len());

        let (sender, receiver) = oneshot::channel();
        let shared = Arc::clone(&self.shared);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            let outcome = tokio::task::spawn_blocking(move || build_corpus(documents, &config))
                .await
                .unwrap_or_else(|e| Err(AppError::Other(format!("Indexing task failed: {}", e))));

            let report = {
                let mut state = lock(&shared);
                if state.generation != generation {
                    tracing::debug!("Discarding stale index build (generation {})", generation);
                    Err(AppError::Cancelled)
                } else {
                    state.indexing = false;
                    match outcome {
                        Ok(snapshot) => {
                            let stats = snapshot.stats();
                            state.snapshot = Some(Arc::new(snapshot));
                            state.failure = None;
                            Ok(stats)
                        }
                        Err(e) => {
                            tracing::warn!("Indexing failed: {}", e);
                            state.snapshot = None;
                            state.failure = Some(e.to_string());
                            Err(e)
                        }
                    }
                }
            };

            let _ = sender.send(report);
        });

        Ok(IndexingHandle { receiver })
    }

    /// Answer `question` in the background against the current snapshot.
    ///
    /// # Errors
    /// - `AppError::SessionBusy` while a question is in flight or documents
    ///   are being indexed
    /// - `AppError::NotReady` when nothing has been indexed
    pub fn ask(&self, question: impl Into<String>) -> AppResult<QueryHandle> {
        let mut shared = lock(&self.shared);
        if shared.in_flight.is_some() {
            return Err(AppError::SessionBusy(
                "a question is already being answered".to_string(),
            ));
        }
        if shared.indexing {
            return Err(AppError::SessionBusy(
                "documents are being indexed".to_string(),
            ));
        }
        let snapshot = shared.snapshot.clone().ok_or_else(|| {
            AppError::NotReady("no documents have been indexed".to_string())
        })?;

        let id = Uuid::new_v4();
        let query = Query::new(question);
        let (sender, receiver) = oneshot::channel();

        let task_shared = Arc::clone(&self.shared);
        let backend = self.backend.clone();
        let config = Arc::clone(&self.config);

        // The slot is filled before the lock is released, so the task cannot
        // observe an empty slot on completion.
        let task = tokio::spawn(async move {
            let guard = InFlightGuard {
                shared: task_shared,
                id,
                sender: Some(sender),
            };
            let result = answer_query(snapshot, &backend, &config, query).await;
            guard.complete(result);
        });

        shared.in_flight = Some(InFlight {
            id,
            abort: task.abort_handle(),
        });
        tracing::debug!("Question {} in flight", id);

        Ok(QueryHandle { id, receiver })
    }

    /// Ask and deliver the outcome to `callback` instead of a handle.
    ///
    /// The callback is not invoked for a cancelled question. Every other
    /// outcome, failures included, reaches it.
    pub fn ask_with_callback<F>(&self, question: impl Into<String>, callback: F) -> AppResult<()>
    where
        F: FnOnce(AppResult<Answer>) + Send + 'static,
    {
        let handle = self.ask(question)?;
        tokio::spawn(async move {
            match handle.wait().await {
                Err(AppError::Cancelled) => {
                    tracing::debug!("Question cancelled; callback skipped");
                }
                outcome => callback(outcome),
            }
        });
        Ok(())
    }

    /// Abort the question in flight, if any.
    ///
    /// Its handle resolves to `AppError::Cancelled`. Returns whether a
    /// question was cancelled.
    pub fn cancel(&self) -> bool {
        let in_flight = lock(&self.shared).in_flight.take();
        match in_flight {
            Some(in_flight) => {
                in_flight.abort.abort();
                tracing::info!("Cancelled question {}", in_flight.id);
                true
            }
            None => false,
        }
    }

    /// Drop the indexed documents and any indexing failure.
    ///
    /// A running index build is discarded when it finishes. A question in
    /// flight keeps its own snapshot and completes normally.
    pub fn clear(&self) {
        let mut shared = lock(&self.shared);
        shared.generation += 1;
        shared.indexing = false;
        shared.snapshot = None;
        shared.failure = None;
        tracing::info!("Session cleared");
    }
}

impl Drop for QuerySession {
    fn drop(&mut self) {
        self.cancel();
    }
}
