//! Voice loop: speech capture in, assistant turn, speech synthesis out.
//!
//! Capture and synthesis are collaborator traits so the loop does not
//! depend on any particular speech API. The loop awaits one finalized
//! utterance, runs the turn to completion, speaks the reply, and only then
//! asks for the next utterance.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};

use crate::assistant::Assistant;
use crate::error::ChatError;
use crate::transcript::GREETING;

/// Spoken after a capture failure the user should hear about.
pub const CAPTURE_ERROR_REPLY: &str = "Sorry, I had an error. Please try again.";

/// Why a capture attempt produced no utterance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// The user said nothing before the recognizer gave up.
    #[error("no speech detected")]
    NoSpeech,
    /// Capture was cancelled by the host.
    #[error("capture aborted")]
    Aborted,
    #[error("capture failed: {0}")]
    Failed(String),
}

impl CaptureError {
    /// Whether the user should be told about this failure.
    pub fn is_audible(&self) -> bool {
        matches!(self, CaptureError::Failed(_))
    }
}

/// Produces finalized user utterances, one per turn.
pub trait TranscriptSource: Send {
    /// Wait for the next utterance. `Ok(None)` means the source is closed.
    fn next_utterance(
        &mut self,
    ) -> impl Future<Output = Result<Option<String>, CaptureError>> + Send;
}

/// Consumes assistant replies, typically by speaking them.
pub trait SpeechSink: Send + Sync {
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), ChatError>> + Send;
}

// =============================================================================
// VoiceLoop
// =============================================================================

/// Drives an [`Assistant`] from a [`TranscriptSource`] to a [`SpeechSink`].
pub struct VoiceLoop<S, K> {
    source: S,
    sink: K,
    speak_greeting: bool,
    speech_enabled: bool,
}

impl<S: TranscriptSource, K: SpeechSink> VoiceLoop<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self {
            source,
            sink,
            speak_greeting: false,
            speech_enabled: true,
        }
    }

    /// Speak the greeting before the first utterance.
    pub fn with_greeting(mut self, speak_greeting: bool) -> Self {
        self.speak_greeting = speak_greeting;
        self
    }

    /// When disabled, replies are still produced and recorded but not spoken.
    pub fn with_speech(mut self, enabled: bool) -> Self {
        self.speech_enabled = enabled;
        self
    }

    /// Run turns until the source closes. Returns the number of turns handled.
    pub async fn run(&mut self, assistant: &mut Assistant) -> Result<usize, ChatError> {
        if self.speak_greeting {
            self.say(GREETING).await;
        }

        let mut turns = 0;
        loop {
            let utterance = match self.source.next_utterance().await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) if e.is_audible() => {
                    tracing::warn!(error = %e, "Speech capture failed");
                    self.say(CAPTURE_ERROR_REPLY).await;
                    continue;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Capture ended without speech");
                    continue;
                }
            };

            let reply = match assistant.handle(&utterance) {
                Ok(reply) => reply,
                Err(ChatError::EmptyMessage) => continue,
                Err(e @ ChatError::MessageTooLong(_)) => {
                    tracing::warn!(error = %e, "Utterance rejected");
                    continue;
                }
                Err(e) => return Err(e),
            };
            turns += 1;
            self.say(&reply).await;
        }

        tracing::info!(turns, "Voice loop finished");
        Ok(turns)
    }

    async fn say(&self, text: &str) {
        if !self.speech_enabled {
            return;
        }
        if let Err(e) = self.sink.speak(text).await {
            tracing::warn!(error = %e, "Speech output failed");
        }
    }
}

// =============================================================================
// Test doubles
// =============================================================================

/// Source that replays a fixed script of capture results.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Result<String, CaptureError>>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<String, CaptureError>>) -> Self {
        Self {
            script: script.into(),
        }
    }

    /// Script consisting only of successful utterances.
    pub fn from_utterances(utterances: &[&str]) -> Self {
        Self::new(utterances.iter().map(|u| Ok(u.to_string())).collect())
    }
}

impl TranscriptSource for ScriptedSource {
    async fn next_utterance(&mut self) -> Result<Option<String>, CaptureError> {
        self.script.pop_front().transpose()
    }
}

/// Sink that records everything it is asked to speak.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    spoken: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

impl SpeechSink for RecordingSink {
    async fn speak(&self, text: &str) -> Result<(), ChatError> {
        self.spoken
            .lock()
            .map_err(|e| ChatError::VoiceError(format!("sink lock poisoned: {}", e)))?
            .push(text.to_string());
        Ok(())
    }
}
