pub mod openai;

use async_trait::async_trait;
use futures::{ Future, Stream };
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::LlmConfig;
use self::openai::OpenAIChatClient;
use crate::models::chat::PayloadMessage;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("upstream stream interrupted: {0}")]
    Stream(#[source] reqwest::Error),

    #[error("malformed upstream event stream: {0}")]
    Decode(String),

    #[error("upstream reported an error: {0}")]
    Upstream(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

/// Text deltas in arrival order. An `Err` item ends the stream.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<String, ChatError>> + Send>>;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Opens a streamed completion. Failures before the first delta is available
    /// are returned here rather than through the stream.
    async fn stream_chat(&self, messages: Vec<PayloadMessage>) -> Result<ChatStream, ChatError>;

    fn model(&self) -> &str;
}

pub fn create_streaming_response<F, Fut>(response_fn: F) -> ChatStream
    where
        F: FnOnce(mpsc::Sender<Result<String, ChatError>>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static
{
    let (tx, rx) = mpsc::channel(32);

    tokio::spawn(async move {
        response_fn(tx).await;
    });

    Box::pin(ReceiverStream::new(rx))
}

/// Builds the upstream client, or `None` when no credential is configured.
pub fn new_client(config: &LlmConfig) -> Result<Option<Arc<dyn ChatClient>>, ChatError> {
    if config.api_key.as_deref().map(str::trim).unwrap_or("").is_empty() {
        return Ok(None);
    }
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Some(Arc::new(client)))
}
