use async_trait::async_trait;
use bytes::Bytes;
use eventsource_stream::{ Event, EventStreamError, Eventsource };
use futures::{ stream, Stream, StreamExt };
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ create_streaming_response, ChatClient, ChatError, ChatStream };
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL, DEFAULT_MODEL };
use crate::models::chat::PayloadMessage;

const CHAT_COMPLETIONS_ROUTE: &str = "/chat/completions";

pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    url: String,
    temperature: f32,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [PayloadMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAIStreamResponse {
    #[serde(default)]
    choices: Vec<OpenAIStreamChoice>,
    error: Option<OpenAIErrorBody>,
}

#[derive(Deserialize)]
struct OpenAIStreamChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Deserialize, Default)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIErrorBody {
    message: String,
}

/// What a single event from the completions stream means.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum StreamEvent {
    Delta(String),
    Done,
    Error(String),
    Skip,
}

pub(crate) fn parse_event_data(data: &str) -> StreamEvent {
    let data = data.trim();
    if data.is_empty() {
        return StreamEvent::Skip;
    }
    if data == "[DONE]" {
        return StreamEvent::Done;
    }
    match serde_json::from_str::<OpenAIStreamResponse>(data) {
        Ok(resp) => {
            if let Some(err) = resp.error {
                return StreamEvent::Error(err.message);
            }
            let content = resp.choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default();
            if content.is_empty() {
                StreamEvent::Skip
            } else {
                StreamEvent::Delta(content)
            }
        }
        Err(e) => {
            debug!("Skipping unparseable stream event: {} for data: {}", e, data);
            StreamEvent::Skip
        }
    }
}

/// Parses an upstream byte stream into completion events. A trailing blank line is
/// appended so an event cut off by the end of the body is still dispatched.
fn completion_events<S>(bytes: S) -> impl Stream<Item = Result<Event, EventStreamError<reqwest::Error>>>
    where S: Stream<Item = Result<Bytes, reqwest::Error>>
{
    bytes.chain(stream::once(async { Ok(Bytes::from_static(b"\n\n")) })).eventsource()
}

impl OpenAIChatClient {
    pub fn new(
        api_key: &str,
        model: Option<String>,
        base_url: Option<String>,
        temperature: f32
    ) -> Result<Self, ChatError> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base = base.trim_end_matches('/');
        let url = if base.ends_with(CHAT_COMPLETIONS_ROUTE) {
            base.to_string()
        } else {
            format!("{}{}", base, CHAT_COMPLETIONS_ROUTE)
        };

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e|
            ChatError::Config(format!("Invalid API key format: {}", e))
        )?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = HttpClient::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ChatError::Config(e.to_string()))?;

        info!("OpenAI chat client ready: model={}, url={}", chat_model, url);

        Ok(Self {
            http,
            model: chat_model,
            url,
            temperature,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ChatError> {
        let api_key = config.api_key
            .as_deref()
            .ok_or_else(|| ChatError::Config("OpenAI API key is required".to_string()))?;

        Self::new(
            api_key,
            config.completion_model.clone(),
            config.base_url.clone(),
            config.temperature
        )
    }
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn stream_chat(&self, messages: Vec<PayloadMessage>) -> Result<ChatStream, ChatError> {
        let req = OpenAIChatRequest {
            model: &self.model,
            messages: &messages,
            temperature: self.temperature,
            stream: true,
        };

        let resp = self.http.post(&self.url).json(&req).send().await.map_err(ChatError::Request)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let events = completion_events(resp.bytes_stream());

        Ok(
            create_streaming_response(move |tx| async move {
                futures::pin_mut!(events);
                while let Some(event_result) = events.next().await {
                    let event = match event_result {
                        Ok(event) => event,
                        Err(EventStreamError::Transport(e)) => {
                            let _ = tx.send(Err(ChatError::Stream(e))).await;
                            return;
                        }
                        Err(e) => {
                            let _ = tx.send(Err(ChatError::Decode(e.to_string()))).await;
                            return;
                        }
                    };
                    match parse_event_data(&event.data) {
                        StreamEvent::Delta(content) => {
                            if tx.send(Ok(content)).await.is_err() {
                                return;
                            }
                        }
                        StreamEvent::Done => {
                            return;
                        }
                        StreamEvent::Error(message) => {
                            warn!("Upstream error event: {}", message);
                            let _ = tx.send(Err(ChatError::Upstream(message))).await;
                            return;
                        }
                        StreamEvent::Skip => {}
                    }
                }
            })
        )
    }

    fn model(&self) -> &str {
        &self.model
    }
}
