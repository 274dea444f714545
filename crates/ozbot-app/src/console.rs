//! Terminal stand-ins for speech capture and synthesis.
//!
//! Each stdin line is treated as one finalized utterance and each reply is
//! printed on its own line.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use ozbot_chat::voice::{CaptureError, SpeechSink, TranscriptSource};
use ozbot_chat::ChatError;

pub struct StdinSource {
    lines: Lines<BufReader<Stdin>>,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl TranscriptSource for StdinSource {
    async fn next_utterance(&mut self) -> Result<Option<String>, CaptureError> {
        prompt();
        match self.lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Err(CaptureError::NoSpeech),
            Ok(line) => Ok(line),
            Err(e) => Err(CaptureError::Failed(e.to_string())),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

pub struct StdoutSink;

impl SpeechSink for StdoutSink {
    async fn speak(&self, text: &str) -> Result<(), ChatError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "OzBot: {}", text).map_err(|e| ChatError::VoiceError(e.to_string()))
    }
}

fn prompt() {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "> ").and_then(|_| out.flush());
}
