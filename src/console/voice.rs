//! Optional speech input and output. Implementations are chosen once at start-up;
//! the console never probes for them on its own.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoiceError {
    #[error("speech recognition unavailable")]
    Unavailable,
    #[error("{0}")]
    Recognition(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub lang: String,
}

impl Utterance {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rate: 1.02,
            pitch: 1.05,
            lang: "en-US".to_string(),
        }
    }
}

pub trait SpeechSynthesizer: Send + Sync {
    fn is_available(&self) -> bool;
    fn speak(&self, utterance: Utterance);
    /// Stops whatever is currently being spoken.
    fn cancel(&self);
}

/// One recognition result. Interim results may be revised; final ones are not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recognition {
    pub transcript: String,
    pub is_final: bool,
}

impl Recognition {
    pub fn interim(transcript: impl Into<String>) -> Self {
        Self { transcript: transcript.into(), is_final: false }
    }

    pub fn finalized(transcript: impl Into<String>) -> Self {
        Self { transcript: transcript.into(), is_final: true }
    }
}

/// Ends when the recognizer stops listening.
pub type RecognitionStream = Pin<Box<dyn Stream<Item = Result<Recognition, VoiceError>> + Send>>;

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;
    async fn listen(&self) -> Result<RecognitionStream, VoiceError>;
    fn stop(&self);
}

pub struct SilentSynthesizer;

impl SpeechSynthesizer for SilentSynthesizer {
    fn is_available(&self) -> bool {
        false
    }

    fn speak(&self, _utterance: Utterance) {}

    fn cancel(&self) {}
}

pub struct UnavailableRecognizer;

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn listen(&self) -> Result<RecognitionStream, VoiceError> {
        Err(VoiceError::Unavailable)
    }

    fn stop(&self) {}
}

#[derive(Clone)]
pub struct VoiceCapabilities {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
}

impl VoiceCapabilities {
    pub fn new(
        synthesizer: Arc<dyn SpeechSynthesizer>,
        recognizer: Arc<dyn SpeechRecognizer>
    ) -> Self {
        Self { synthesizer, recognizer }
    }

    pub fn disabled() -> Self {
        Self::new(Arc::new(SilentSynthesizer), Arc::new(UnavailableRecognizer))
    }

    pub fn output_online(&self) -> bool {
        self.synthesizer.is_available()
    }

    pub fn input_online(&self) -> bool {
        self.recognizer.is_available()
    }
}

impl Default for VoiceCapabilities {
    fn default() -> Self {
        Self::disabled()
    }
}
