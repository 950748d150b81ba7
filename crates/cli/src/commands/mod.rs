//! Command handlers for the DocQA CLI.
//!
//! This module organizes all CLI commands into separate submodules, plus the
//! session setup and answer printing they share.

pub mod ask;
pub mod chat;
pub mod models;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use models::ModelsCommand;

use docqa_core::{config::AppConfig, AppResult, RagConfig};
use docqa_knowledge::{Answer, FolderSource, QuerySession};
use docqa_llm::create_clients;
use std::path::Path;
use std::time::Duration;

/// Start a session on the configured backends and index `folder`.
pub(crate) async fn open_session(
    config: &AppConfig,
    rag: RagConfig,
    folder: &Path,
) -> AppResult<QuerySession> {
    let timeout = Duration::from_secs(rag.request_timeout_seconds);
    let backends = create_clients(&config.backends, timeout);
    let session = QuerySession::start(rag, &backends).await?;

    load_folder(&session, folder).await?;
    Ok(session)
}

/// Read `folder` and index it into `session`, waiting for the build.
pub(crate) async fn load_folder(session: &QuerySession, folder: &Path) -> AppResult<()> {
    let documents = FolderSource::new(folder).load()?;
    let stats = session.load(documents)?.wait().await?;
    eprintln!(
        "Indexed {} documents ({} chunks, {} terms) from {}",
        stats.documents,
        stats.chunks,
        stats.vocabulary,
        folder.display()
    );
    Ok(())
}

/// Print an answer as text (with the retrieved context) or as JSON.
pub(crate) fn print_answer(answer: &Answer, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::json!({
            "answer": answer.text,
            "model": answer.model,
            "provider": answer.provider,
            "question": answer.query.text,
            "citedSources": answer.cited_sources,
            "excerpts": answer.excerpts,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", answer.text);

    if !answer.excerpts.is_empty() {
        println!();
        println!("Retrieved context:");
        for excerpt in &answer.excerpts {
            println!(
                "  [{}] ({:.3}) {}",
                excerpt.document_name, excerpt.score, excerpt.preview
            );
        }
    }

    tracing::debug!("Answered by '{}' on '{}'", answer.model, answer.provider);
    Ok(())
}
