mod answer;
mod config;
mod dispatcher;
mod document;
mod error;
mod llm;
mod mailer;
mod mcp;
mod registry;
mod tools;

use anyhow::Result;
use answer::AnswerEngine;
use config::Config;
use dispatcher::Dispatcher;
use document::{DocumentCache, PdfDocument};
use mailer::{NotificationSender, ResendTransport};
use mcp::McpServer;
use std::sync::Arc;
use tools::{AskAboutCv, SendEmail};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Load configuration
    let config = Config::load("config.toml")?;

    // Initialize logging (stderr; stdout carries protocol messages)
    init_logging(&config.logging.level);
    log::info!("Starting CV assistant MCP server...");
    log::info!("Configuration loaded successfully");

    // Refuse to serve without sender credentials
    config.validate()?;

    let cache = Arc::new(DocumentCache::new(Box::new(PdfDocument::new(
        &config.document.path,
    ))));

    let engine = Arc::new(AnswerEngine::from_config(&config));
    if engine.is_live() {
        log::info!("Answering with model {}", config.ai_model.model);
    } else {
        log::warn!("No inference API key configured, answering in fallback mode");
    }

    let transport = ResendTransport::new(config.email.endpoint.clone(), config.email.api_key.clone());
    let sender = Arc::new(NotificationSender::new(
        config.email.from.clone(),
        Arc::new(transport),
    ));

    let dispatcher = Dispatcher::new(AskAboutCv::new(cache, engine), SendEmail::new(sender));

    McpServer::new(dispatcher).run().await?;

    log::info!("Server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(level: &str) {
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string());
    pretty_env_logger::formatted_builder()
        .parse_filters(&filters)
        .init();
}
