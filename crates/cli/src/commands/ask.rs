//! Ask command handler.
//!
//! Indexes a folder, answers one question and exits.

use super::{open_session, print_answer};
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use std::path::PathBuf;

/// Ask one question about a folder of documents
#[derive(Args, Debug)]
pub struct AskCommand {
    /// Folder containing .txt / .md documents
    pub folder: PathBuf,

    /// The question to ask
    pub question: String,

    /// Maximum number of excerpts to retrieve
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let question = self.question.trim();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let mut rag = config.rag.clone();
        if let Some(top_k) = self.top_k {
            rag.top_k = top_k;
        }

        let session = open_session(config, rag, &self.folder).await?;
        let handle = session.ask(question)?;

        let answer = tokio::select! {
            answer = handle.wait() => answer?,
            _ = tokio::signal::ctrl_c() => {
                session.cancel();
                return Err(AppError::Cancelled);
            }
        };

        print_answer(&answer, self.json)
    }
}
