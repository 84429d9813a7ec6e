use crate::config::prompt::{
    ERROR_INVALID_JSON,
    ERROR_INVALID_MESSAGE,
    ERROR_MISSING_CREDENTIAL,
    ERROR_MISSING_MESSAGES,
    ERROR_UPSTREAM,
    RELAY_SYSTEM_PROMPT,
};
use crate::llm::chat::{ ChatClient, ChatError };
use crate::models::chat::{ PayloadMessage, Role };
use crate::models::relay::ErrorBody;
use axum::{
    body::{ Body, Bytes },
    extract::State,
    http::{ header, StatusCode },
    response::{ IntoResponse, Response },
    routing::{ get, post },
    Json,
    Router,
};
use futures::TryStreamExt;
use log::{ error, info };
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::{ Any, CorsLayer };

pub const DEFAULT_RELAY_PATH: &str = "/api/agent";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{}", ERROR_MISSING_CREDENTIAL)]
    MissingCredential,
    #[error("{}", ERROR_INVALID_JSON)]
    InvalidJson,
    #[error("{}", ERROR_MISSING_MESSAGES)]
    MissingMessages,
    #[error("{}", ERROR_INVALID_MESSAGE)]
    InvalidMessage,
    #[error("{}", ERROR_UPSTREAM)]
    Upstream(#[source] ChatError),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidJson | RelayError::MissingMessages | RelayError::InvalidMessage =>
                StatusCode::BAD_REQUEST,
            RelayError::MissingCredential | RelayError::Upstream(_) =>
                StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

/// Shared handler state. `chat_client` is `None` when no upstream credential is configured.
#[derive(Clone)]
pub struct AppState {
    pub chat_client: Option<Arc<dyn ChatClient>>,
}

impl AppState {
    pub fn new(chat_client: Option<Arc<dyn ChatClient>>) -> Self {
        Self { chat_client }
    }
}

pub fn router(state: AppState, relay_path: &str) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route(relay_path, post(relay_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Parses `{ "messages": [{ role, content }, ...] }`, ignoring any other fields.
pub fn parse_relay_body(body: &[u8]) -> Result<Vec<PayloadMessage>, RelayError> {
    let value: Value = serde_json::from_slice(body).map_err(|_| RelayError::InvalidJson)?;
    let messages = value
        .get("messages")
        .and_then(Value::as_array)
        .ok_or(RelayError::MissingMessages)?;

    messages
        .iter()
        .map(|m| PayloadMessage::deserialize(m).map_err(|_| RelayError::InvalidMessage))
        .collect()
}

/// Drops caller-supplied system messages and prepends the relay's own instruction.
pub fn normalize_payload_messages(messages: Vec<PayloadMessage>) -> Vec<PayloadMessage> {
    std::iter
        ::once(PayloadMessage::new(Role::System, RELAY_SYSTEM_PROMPT))
        .chain(messages.into_iter().filter(|m| m.role != Role::System))
        .collect()
}

async fn relay_handler(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let client = state.chat_client.clone().ok_or(RelayError::MissingCredential)?;
    let messages = normalize_payload_messages(parse_relay_body(&body)?);
    info!("Relaying {} messages to model {}", messages.len(), client.model());

    let stream = client.stream_chat(messages).await.map_err(|e| {
        error!("Jarvis inference failure: {}", e);
        RelayError::Upstream(e)
    })?;

    let stream = stream.inspect_err(|e| error!("Upstream stream aborted: {}", e));

    Ok(
        (
            [
                (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
                (header::CACHE_CONTROL, "no-store"),
            ],
            Body::from_stream(stream),
        ).into_response()
    )
}

async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}
