//! Chat command handler.
//!
//! Interactive loop over one indexed folder. Ctrl-C cancels the answer in
//! progress; `exit` or `quit` leaves.

use super::{load_folder, open_session, print_answer};
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Interactive question session over a folder of documents
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Folder containing .txt / .md documents
    pub folder: PathBuf,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let session = open_session(config, config.rag.clone(), &self.folder).await?;
        eprintln!(
            "Using model '{}'. Type a question, '/reload' to re-read the folder, 'exit' to quit.",
            session.selected_model()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let input = line.trim();

            match input {
                "" => continue,
                "exit" | "quit" => break,
                "/reload" => {
                    if let Err(e) = load_folder(&session, &self.folder).await {
                        eprintln!("Reload failed: {}", e);
                    }
                    continue;
                }
                _ => {}
            }

            let handle = match session.ask(input) {
                Ok(handle) => handle,
                Err(e) => {
                    eprintln!("{}", e);
                    continue;
                }
            };

            tokio::select! {
                outcome = handle.wait() => match outcome {
                    Ok(answer) => print_answer(&answer, false)?,
                    Err(AppError::Cancelled) => eprintln!("(cancelled)"),
                    Err(e) => eprintln!("Error: {}", e),
                },
                _ = tokio::signal::ctrl_c() => {
                    session.cancel();
                    eprintln!("(cancelled)");
                }
            }
            println!();
        }

        tracing::info!("Chat session ended");
        Ok(())
    }
}
