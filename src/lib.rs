pub mod cli;
pub mod config;
pub mod console;
pub mod llm;
pub mod models;
pub mod server;

use cli::Args;
use llm::chat::new_client as new_chat_client;
use llm::LlmConfig;
use log::info;
use server::api::AppState;
use server::Server;
use std::error::Error;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    let llm_config = LlmConfig::from_args(&args);

    info!("--- Relay Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Relay Path: {}", args.relay_path);
    info!("Model: {}", llm_config.model());
    info!("Upstream Base URL: {}", llm_config.base_url.as_deref().unwrap_or(llm::DEFAULT_BASE_URL));
    info!("Temperature: {}", llm_config.temperature);
    info!("Credential Configured: {}", llm_config.api_key.is_some());
    info!("TLS Enabled: {}", args.tls_paths().is_some());
    info!("---------------------------");

    let chat_client = new_chat_client(&llm_config)?;
    let server = Server::new(args.server_addr.clone(), AppState::new(chat_client), args);
    server.run().await
}
