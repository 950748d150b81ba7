//! Models command handler.
//!
//! Lists the models each configured backend serves and shows which one a
//! session would select.

use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_llm::{create_client, select_from_listings, LlmClient};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// List available models and the one that would be selected
#[derive(Args, Debug)]
pub struct ModelsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ModelsCommand {
    /// Execute the models command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing models command");

        let timeout = Duration::from_secs(config.rag.request_timeout_seconds);

        let mut clients: Vec<Arc<dyn LlmClient>> = Vec::new();
        let mut rows = Vec::new();
        for backend in &config.backends {
            let api_key = backend.resolve_api_key();
            match create_client(
                &backend.provider,
                backend.endpoint.as_deref(),
                api_key.as_deref(),
                timeout,
            ) {
                Ok(client) => clients.push(client),
                Err(e) => rows.push(serde_json::json!({
                    "provider": backend.provider,
                    "error": e.to_string(),
                })),
            }
        }

        let listings = join_all(clients.iter().map(|c| c.list_models())).await;
        for (client, listing) in clients.iter().zip(&listings) {
            rows.push(match listing {
                Ok(models) => serde_json::json!({
                    "provider": client.provider_name(),
                    "models": models,
                }),
                Err(e) => serde_json::json!({
                    "provider": client.provider_name(),
                    "error": e.to_string(),
                }),
            });
        }

        let selected =
            select_from_listings(&clients, &listings, &config.rag.model_priority_list);

        if self.json {
            let output = serde_json::json!({
                "backends": rows,
                "selected": selected.as_ref().ok().map(|s| serde_json::json!({
                    "provider": s.client.provider_name(),
                    "model": s.model,
                })),
                "error": selected.as_ref().err().map(|e| e.to_string()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        for row in &rows {
            let provider = row["provider"].as_str().unwrap_or("?");
            match row.get("models").and_then(|m| m.as_array()) {
                Some(models) => {
                    println!("{}:", provider);
                    for model in models {
                        println!("  {}", model.as_str().unwrap_or_default());
                    }
                }
                None => println!(
                    "{}: unavailable ({})",
                    provider,
                    row["error"].as_str().unwrap_or("unknown error")
                ),
            }
        }

        let selected = selected?;
        println!();
        println!(
            "Selected: {} ({})",
            selected.model,
            selected.client.provider_name()
        );
        Ok(())
    }
}
