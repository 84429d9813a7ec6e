use clap::Parser;

use crate::llm::{ DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE };
use crate::server::api::DEFAULT_RELAY_PATH;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Jarvis relay: streams chat completions to the console", long_about = None)]
pub struct Args {
    // --- Server Args ---
    /// Host address and port for the relay to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:3000")]
    pub server_addr: String,

    /// Route that accepts chat relay requests.
    #[arg(long, env = "RELAY_PATH", default_value = DEFAULT_RELAY_PATH)]
    pub relay_path: String,

    // --- Upstream Provider Args ---
    /// API key for the upstream chat completion provider. Requests fail with 500 when unset.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Model name for chat completion.
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub openai_model: String,

    /// Base URL of the chat completion API (e.g., https://api.openai.com/v1)
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub openai_base_url: Option<String>,

    /// Sampling temperature sent with every completion request.
    #[arg(long, env = "TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    // --- TLS Args ---
    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,

    /// Optional path to the TLS certificate file (PEM format). Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format). Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,
}

impl Args {
    pub fn tls_paths(&self) -> Option<(&str, &str)> {
        if !self.enable_tls {
            return None;
        }
        match (self.tls_cert_path.as_deref(), self.tls_key_path.as_deref()) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Terminal console for a running Jarvis relay", long_about = None)]
pub struct ConsoleArgs {
    /// Full URL of the relay route.
    #[arg(long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000/api/agent")]
    pub relay_url: String,

    /// Start with voice output muted.
    #[arg(long, env = "MUTED", default_value = "false")]
    pub muted: bool,
}
