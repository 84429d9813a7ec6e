#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::{ stream, StreamExt };
use jarvis::console::transport::{ ByteStream, RelayTransport };
use jarvis::console::voice::{
    RecognitionStream,
    Recognition,
    SpeechRecognizer,
    SpeechSynthesizer,
    Utterance,
    VoiceError,
};
use jarvis::console::ConsoleError;
use jarvis::llm::chat::{ ChatClient, ChatError, ChatStream };
use jarvis::models::chat::{ PayloadMessage, RelayRequest };
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Upstream stand-in that replays fixed deltas and records what it was sent.
#[derive(Default)]
pub struct ScriptedClient {
    pub chunks: Vec<&'static str>,
    pub fail_before_stream: bool,
    pub fail_mid_stream: bool,
    pub seen: Mutex<Vec<Vec<PayloadMessage>>>,
}

impl ScriptedClient {
    pub fn replying(chunks: Vec<&'static str>) -> Self {
        Self { chunks, ..Self::default() }
    }

    pub fn seen(&self) -> Vec<Vec<PayloadMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn stream_chat(&self, messages: Vec<PayloadMessage>) -> Result<ChatStream, ChatError> {
        self.seen.lock().unwrap().push(messages);
        if self.fail_before_stream {
            return Err(ChatError::Upstream("refused".into()));
        }
        let mut items: Vec<Result<String, ChatError>> = self.chunks
            .iter()
            .map(|c| Ok(c.to_string()))
            .collect();
        if self.fail_mid_stream {
            items.push(Err(ChatError::Upstream("connection reset".into())));
        }
        Ok(Box::pin(stream::iter(items)))
    }

    fn model(&self) -> &str {
        "scripted"
    }
}

/// What a [`ChunkTransport`] does after sending its chunks.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    End,
    Fail,
    Hang,
}

pub struct ChunkTransport {
    pub chunks: Vec<Vec<u8>>,
    pub tail: Tail,
    pub hang_on_send: bool,
    pub reject: Option<(u16, String)>,
    /// With `Tail::End`, holds the body open until cancelled.
    pub release: Option<CancellationToken>,
    pub requests: Mutex<Vec<RelayRequest>>,
}

impl ChunkTransport {
    pub fn new(chunks: &[&str], tail: Tail) -> Self {
        Self::from_bytes(
            chunks
                .iter()
                .map(|c| c.as_bytes().to_vec())
                .collect(),
            tail
        )
    }

    pub fn from_bytes(chunks: Vec<Vec<u8>>, tail: Tail) -> Self {
        Self {
            chunks,
            tail,
            hang_on_send: false,
            reject: None,
            release: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RelayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelayTransport for ChunkTransport {
    async fn send(&self, request: &RelayRequest) -> Result<ByteStream, ConsoleError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.hang_on_send {
            return std::future::pending().await;
        }
        if let Some((status, message)) = &self.reject {
            return Err(ConsoleError::Rejected { status: *status, message: message.clone() });
        }
        let body = stream::iter(
            self.chunks
                .clone()
                .into_iter()
                .map(|c| Ok::<_, ConsoleError>(Bytes::from(c)))
        );
        let stream: ByteStream = match (self.tail, self.release.clone()) {
            (Tail::End, None) => Box::pin(body),
            (Tail::End, Some(release)) => {
                let held = stream
                    ::once(async move { release.cancelled().await })
                    .filter_map(|_| async { None::<Result<Bytes, ConsoleError>> });
                Box::pin(body.chain(held))
            }
            (Tail::Fail, _) =>
                Box::pin(body.chain(stream::once(async { Err(ConsoleError::Stream("reset".into())) }))),
            (Tail::Hang, _) => Box::pin(body.chain(stream::pending())),
        };
        Ok(stream)
    }
}

#[derive(Default)]
pub struct RecordingSynthesizer {
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: Mutex<usize>,
}

impl RecordingSynthesizer {
    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.text.clone())
            .collect()
    }
}

impl SpeechSynthesizer for RecordingSynthesizer {
    fn is_available(&self) -> bool {
        true
    }

    fn speak(&self, utterance: Utterance) {
        self.spoken.lock().unwrap().push(utterance);
    }

    fn cancel(&self) {
        *self.cancels.lock().unwrap() += 1;
    }
}

pub struct ScriptedRecognizer {
    pub results: Vec<Result<Recognition, VoiceError>>,
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn listen(&self) -> Result<RecognitionStream, VoiceError> {
        Ok(Box::pin(stream::iter(self.results.clone())))
    }

    fn stop(&self) {}
}

/// Recognizer that reports one interim result and then keeps listening until
/// `stop` is called, at which point it finalizes.
#[derive(Default)]
pub struct HeldRecognizer {
    pub stopped: CancellationToken,
    pub stops: Mutex<usize>,
}

#[async_trait]
impl SpeechRecognizer for HeldRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn listen(&self) -> Result<RecognitionStream, VoiceError> {
        let stopped = self.stopped.clone();
        let finished = async move {
            stopped.cancelled().await;
            Ok(Recognition::finalized("hold position"))
        };
        Ok(Box::pin(stream::once(async { Ok(Recognition::interim("hold")) }).chain(stream::once(finished))))
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
        self.stopped.cancel();
    }
}
