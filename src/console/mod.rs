//! Console client: owns the transcript and drives one relay exchange at a time.

pub mod decoder;
pub mod transport;
pub mod voice;

use futures::StreamExt;
use log::{ debug, info, warn };
use std::sync::{ Arc, Mutex, MutexGuard, PoisonError };
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::prompt::{
    CONSOLE_SYSTEM_PROMPT,
    ERROR_SPEECH_UNSUPPORTED,
    INITIAL_ASSISTANT_GREETING,
    STATUS_COMPLETE,
    STATUS_DEPLOYING,
    STATUS_LISTENING,
    STATUS_NOMINAL,
    STATUS_OBSTRUCTION,
    STATUS_PROCESSING,
    SUGGESTIONS,
    TRANSMISSION_ABORTED,
    TRANSMISSION_FAILED,
    UNKNOWN_FAILURE,
};
use crate::models::chat::{ ChatMessage, PayloadMessage, RelayRequest, Role };
use decoder::Utf8Accumulator;
use transport::RelayTransport;
use voice::{ Utterance, VoiceCapabilities };

const EVENT_CAPACITY: usize = 256;
const ERROR_SUMMARY_LIMIT: usize = 90;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("{message}")]
    Rejected {
        status: u16,
        message: String,
    },
    #[error("stream error: {0}")]
    Stream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Idle,
    Transmitting,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransmitOutcome {
    /// Blank prompt, or nothing to send.
    Ignored,
    /// Another exchange is in flight; nothing changed.
    Busy,
    Completed,
    Aborted,
    Failed(String),
}

#[derive(Debug, Clone)]
pub enum ConsoleEvent {
    MessageAppended(ChatMessage),
    MessageUpdated {
        id: String,
        content: String,
    },
    MessageFinalized(ChatMessage),
    StatusChanged(String),
    StateChanged(ConsoleState),
    InputChanged(String),
    Error(String),
}

struct Inner {
    messages: Vec<ChatMessage>,
    input: String,
    state: ConsoleState,
    status: String,
    error: Option<String>,
    muted: bool,
    listening: bool,
    cancel: Option<CancellationToken>,
}

/// State owned by one in-flight exchange and dropped with it.
struct Exchange {
    draft_id: String,
    token: CancellationToken,
    decoder: Utf8Accumulator,
}

enum ExchangeEnd {
    Completed,
    Aborted,
}

#[derive(Clone)]
pub struct Console {
    inner: Arc<Mutex<Inner>>,
    transport: Arc<dyn RelayTransport>,
    voice: VoiceCapabilities,
    events: broadcast::Sender<ConsoleEvent>,
}

impl Console {
    pub fn new(transport: Arc<dyn RelayTransport>, voice: VoiceCapabilities) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Inner {
            messages: vec![
                ChatMessage::new(Role::System, CONSOLE_SYSTEM_PROMPT),
                ChatMessage::new(Role::Assistant, INITIAL_ASSISTANT_GREETING)
            ],
            input: String::new(),
            state: ConsoleState::Idle,
            status: STATUS_NOMINAL.to_string(),
            error: None,
            muted: false,
            listening: false,
            cancel: None,
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            transport,
            voice,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: ConsoleEvent) {
        let _ = self.events.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConsoleEvent> {
        self.events.subscribe()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().messages.clone()
    }

    /// Transcript without the leading system message.
    pub fn operational_messages(&self) -> Vec<ChatMessage> {
        self.lock()
            .messages.iter()
            .filter(|m| m.role != Role::System)
            .cloned()
            .collect()
    }

    pub fn state(&self) -> ConsoleState {
        self.lock().state
    }

    pub fn is_transmitting(&self) -> bool {
        self.state() == ConsoleState::Transmitting
    }

    pub fn status(&self) -> String {
        self.lock().status.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// The last error, shortened for a one-line status bar.
    pub fn error_summary(&self) -> Option<String> {
        self.error().map(|e| summarize_error(&e))
    }

    pub fn input(&self) -> String {
        self.lock().input.clone()
    }

    pub fn set_input(&self, input: impl Into<String>) {
        let input = input.into();
        self.lock().input = input.clone();
        self.emit(ConsoleEvent::InputChanged(input));
    }

    pub fn is_muted(&self) -> bool {
        self.lock().muted
    }

    pub fn is_listening(&self) -> bool {
        self.lock().listening
    }

    pub fn voice(&self) -> &VoiceCapabilities {
        &self.voice
    }

    /// Flips console-wide voice output and returns the new muted state.
    pub fn toggle_mute(&self) -> bool {
        let muted = {
            let mut inner = self.lock();
            inner.muted = !inner.muted;
            inner.muted
        };
        if muted {
            self.voice.synthesizer.cancel();
        }
        muted
    }

    /// Mutes or unmutes speech for a single message.
    pub fn set_message_muted(&self, id: &str, muted: bool) -> bool {
        let mut inner = self.lock();
        match inner.messages.iter_mut().find(|m| m.id == id) {
            Some(msg) => {
                msg.muted = muted;
                true
            }
            None => false,
        }
    }

    fn set_status(&self, status: &str) {
        self.lock().status = status.to_string();
        self.emit(ConsoleEvent::StatusChanged(status.to_string()));
    }

    fn record_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.lock().error = Some(error.clone());
        self.emit(ConsoleEvent::Error(error));
    }

    /// Submits the current input field.
    pub async fn submit(&self) -> TransmitOutcome {
        let input = self.input();
        self.transmit(&input).await
    }

    pub async fn submit_suggestion(&self, index: usize) -> TransmitOutcome {
        match SUGGESTIONS.get(index) {
            Some(suggestion) => self.transmit(suggestion.body).await,
            None => TransmitOutcome::Ignored,
        }
    }

    /// Runs one full exchange with the relay. Returns without touching the
    /// transcript when the prompt is blank or another exchange is in flight.
    pub async fn transmit(&self, prompt: &str) -> TransmitOutcome {
        let trimmed = prompt.trim();
        if trimmed.is_empty() {
            return TransmitOutcome::Ignored;
        }

        let user = ChatMessage::new(Role::User, trimmed);
        let draft = ChatMessage::placeholder();
        let token = CancellationToken::new();

        let payload: Vec<PayloadMessage> = {
            let mut inner = self.lock();
            if inner.state == ConsoleState::Transmitting {
                debug!("Ignoring submission while a transmission is in flight");
                return TransmitOutcome::Busy;
            }
            let payload: Vec<PayloadMessage> = inner.messages
                .iter()
                .filter(|m| m.role != Role::System)
                .chain(std::iter::once(&user))
                .map(ChatMessage::to_payload)
                .collect();

            inner.input.clear();
            inner.error = None;
            inner.status = STATUS_DEPLOYING.to_string();
            inner.state = ConsoleState::Transmitting;
            inner.cancel = Some(token.clone());
            inner.messages.push(user.clone());
            inner.messages.push(draft.clone());
            payload
        };

        self.emit(ConsoleEvent::InputChanged(String::new()));
        self.emit(ConsoleEvent::StatusChanged(STATUS_DEPLOYING.to_string()));
        self.emit(ConsoleEvent::StateChanged(ConsoleState::Transmitting));
        self.emit(ConsoleEvent::MessageAppended(user));
        self.emit(ConsoleEvent::MessageAppended(draft.clone()));

        let mut exchange = Exchange {
            draft_id: draft.id,
            token,
            decoder: Utf8Accumulator::new(),
        };
        info!("Transmitting {} messages", payload.len());
        let result = self.run_exchange(&mut exchange, RelayRequest { messages: payload }).await;
        self.finish_exchange(exchange, result)
    }

    async fn run_exchange(
        &self,
        exchange: &mut Exchange,
        request: RelayRequest
    ) -> Result<ExchangeEnd, ConsoleError> {
        let token = exchange.token.clone();

        let mut body = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(ExchangeEnd::Aborted),
            sent = self.transport.send(&request) => sent?,
        };

        self.set_status(STATUS_PROCESSING);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Ok(ExchangeEnd::Aborted),
                next = body.next() => match next {
                    Some(Ok(chunk)) => {
                        let content = exchange.decoder.push(&chunk).to_string();
                        self.update_draft(&exchange.draft_id, content);
                    }
                    Some(Err(e)) => return Err(e),
                    None => return Ok(ExchangeEnd::Completed),
                },
            }
        }
    }

    fn update_draft(&self, id: &str, content: String) {
        {
            let mut inner = self.lock();
            if let Some(msg) = inner.messages.iter_mut().find(|m| m.id == id) {
                msg.content = content.clone();
            }
        }
        self.emit(ConsoleEvent::MessageUpdated { id: id.to_string(), content });
    }

    fn finish_exchange(
        &self,
        exchange: Exchange,
        result: Result<ExchangeEnd, ConsoleError>
    ) -> TransmitOutcome {
        let Exchange { draft_id, decoder, .. } = exchange;

        let (content, state, status, error, outcome) = match result {
            Ok(ExchangeEnd::Completed) => {
                let text = decoder.finish();
                (
                    text.trim_end().to_string(),
                    ConsoleState::Idle,
                    STATUS_COMPLETE,
                    None,
                    TransmitOutcome::Completed,
                )
            }
            Ok(ExchangeEnd::Aborted) => {
                let text = decoder.finish();
                let partial = text.trim_end();
                let content = if partial.is_empty() {
                    TRANSMISSION_ABORTED.to_string()
                } else {
                    partial.to_string()
                };
                info!("Transmission aborted by operator");
                (content, ConsoleState::Aborted, TRANSMISSION_ABORTED, None, TransmitOutcome::Aborted)
            }
            Err(e) => {
                warn!("Transmission failed: {}", e);
                let mut failure = e.to_string();
                if failure.trim().is_empty() {
                    failure = UNKNOWN_FAILURE.to_string();
                }
                (
                    TRANSMISSION_FAILED.to_string(),
                    ConsoleState::Idle,
                    STATUS_OBSTRUCTION,
                    Some(failure.clone()),
                    TransmitOutcome::Failed(failure),
                )
            }
        };

        let finalized = {
            let mut inner = self.lock();
            inner.state = state;
            inner.status = status.to_string();
            inner.cancel = None;
            if error.is_some() {
                inner.error = error.clone();
            }
            inner.messages
                .iter_mut()
                .find(|m| m.id == draft_id)
                .map(|msg| {
                    msg.content = content;
                    msg.pending = false;
                    msg.clone()
                })
        };

        if let Some(error) = error {
            self.emit(ConsoleEvent::Error(error));
        }
        self.emit(ConsoleEvent::StatusChanged(status.to_string()));
        self.emit(ConsoleEvent::StateChanged(state));
        if let Some(msg) = finalized {
            self.speak(&msg);
            self.emit(ConsoleEvent::MessageFinalized(msg));
        }
        outcome
    }

    /// Cancels the in-flight exchange. Returns false when nothing was transmitting.
    pub fn abort(&self) -> bool {
        let inner = self.lock();
        if inner.state != ConsoleState::Transmitting {
            return false;
        }
        match inner.cancel.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn speak(&self, message: &ChatMessage) {
        if message.role != Role::Assistant || message.pending || message.muted {
            return;
        }
        if self.is_muted() || !self.voice.output_online() || message.content.trim().is_empty() {
            return;
        }
        let synthesizer = &self.voice.synthesizer;
        synthesizer.cancel();
        synthesizer.speak(Utterance::new(message.content.clone()));
    }

    /// Listens for one voice command, mirrors interim results into the input
    /// field and transmits the final transcript when recognition ends.
    pub async fn dictate(&self) -> TransmitOutcome {
        let recognizer = self.voice.recognizer.clone();
        if !recognizer.is_available() {
            self.record_error(ERROR_SPEECH_UNSUPPORTED);
            return TransmitOutcome::Ignored;
        }

        let mut results = match recognizer.listen().await {
            Ok(results) => results,
            Err(e) => {
                self.record_error(format!("Mic input error: {}", e));
                return TransmitOutcome::Ignored;
            }
        };

        self.lock().listening = true;
        self.set_status(STATUS_LISTENING);

        let mut final_transcript = String::new();
        while let Some(result) = results.next().await {
            match result {
                Ok(r) if r.is_final => final_transcript.push_str(&r.transcript),
                Ok(r) => self.set_input(format!("{}{}", final_transcript, r.transcript)),
                Err(e) => {
                    self.record_error(format!("Mic input error: {}", e));
                    break;
                }
            }
        }

        self.lock().listening = false;
        self.transmit(&final_transcript).await
    }

    pub fn stop_listening(&self) {
        if self.is_listening() {
            self.voice.recognizer.stop();
        }
    }
}

pub fn summarize_error(error: &str) -> String {
    if error.chars().count() > ERROR_SUMMARY_LIMIT {
        let head: String = error
            .chars()
            .take(ERROR_SUMMARY_LIMIT - 3)
            .collect();
        format!("{}…", head)
    } else {
        error.to_string()
    }
}
