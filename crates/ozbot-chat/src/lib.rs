//! Guided-procedure conversational engine for OzBot.
//!
//! Looks up Standard Operating Procedures by keyword, walks a user through
//! their steps one at a time, answers glossary questions, and keeps the
//! conversation transcript that the history report reads from.

pub mod assistant;
pub mod catalog;
pub mod clock;
pub mod engine;
pub mod error;
pub mod session;
pub mod transcript;
pub mod voice;

pub use assistant::Assistant;
pub use catalog::Catalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{GuideEngine, Outcome};
pub use error::ChatError;
pub use session::SessionState;
pub use transcript::{HistoryReport, Transcript, GREETING};
pub use voice::{CaptureError, SpeechSink, TranscriptSource, VoiceLoop};
