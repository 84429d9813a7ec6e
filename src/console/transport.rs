use async_trait::async_trait;
use bytes::Bytes;
use futures::{ Stream, TryStreamExt };
use reqwest::{ Client as HttpClient, header::{ HeaderValue, CONTENT_TYPE } };
use std::pin::Pin;

use super::ConsoleError;
use crate::models::chat::RelayRequest;
use crate::models::relay::ErrorBody;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ConsoleError>> + Send>>;

/// Carries one relay request and hands back the raw response body.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, request: &RelayRequest) -> Result<ByteStream, ConsoleError>;
}

pub struct HttpRelayTransport {
    http: HttpClient,
    url: String,
}

impl HttpRelayTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, ConsoleError> {
        let http = HttpClient::builder().build().map_err(ConsoleError::Network)?;
        Ok(Self { http, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Prefers the relay's `{ "error": ... }` text, then the raw body, then the status reason.
fn rejection_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if !parsed.error.trim().is_empty() {
            return parsed.error;
        }
    }
    if !body.trim().is_empty() {
        return body.trim().to_string();
    }
    status.canonical_reason().unwrap_or("Request failed").to_string()
}

#[async_trait]
impl RelayTransport for HttpRelayTransport {
    async fn send(&self, request: &RelayRequest) -> Result<ByteStream, ConsoleError> {
        let resp = self.http
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .json(request)
            .send().await
            .map_err(ConsoleError::Network)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConsoleError::Rejected {
                status: status.as_u16(),
                message: rejection_message(status, &body),
            });
        }

        Ok(Box::pin(resp.bytes_stream().map_err(ConsoleError::Network)))
    }
}
