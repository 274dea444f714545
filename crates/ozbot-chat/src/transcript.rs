//! Conversation transcript and the chat-history report built from it.
//!
//! A transcript is append-only and persisted as a JSON array of messages
//! under `<data_dir>/<history_key>.json`.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use ozbot_core::types::{Message, Sender};

use crate::error::ChatError;

/// Opening assistant message of every new conversation.
pub const GREETING: &str = "Hi, I am OzBot. Say \"Hey OzBot\" to start talking.";

/// Longest conversation title before truncation.
const TITLE_MAX_CHARS: usize = 25;

// =============================================================================
// Transcript
// =============================================================================

/// Ordered message log for one history key.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    key: String,
    messages: Vec<Message>,
}

impl Transcript {
    /// Start a fresh conversation containing only the greeting.
    pub fn new(key: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            messages: vec![Message::new(Sender::Assistant, GREETING, now)],
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message and return it.
    pub fn push(&mut self, sender: Sender, text: impl Into<String>, at: DateTime<Utc>) -> &Message {
        self.messages.push(Message::new(sender, text, at));
        &self.messages[self.messages.len() - 1]
    }

    /// Drop all messages and start over with the greeting.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.messages = vec![Message::new(Sender::Assistant, GREETING, now)];
    }

    /// Conversation title: the first user message, shortened to 25
    /// characters plus "..." when longer.
    pub fn title(&self) -> Option<String> {
        let first = self.messages.iter().find(|m| m.sender == Sender::User)?;
        if first.text.chars().count() > TITLE_MAX_CHARS {
            let head: String = first.text.chars().take(TITLE_MAX_CHARS).collect();
            Some(format!("{}...", head))
        } else {
            Some(first.text.clone())
        }
    }

    /// File that stores the transcript for `key` inside `dir`.
    pub fn path_in(dir: &Path, key: &str) -> PathBuf {
        dir.join(format!("{}.json", key))
    }

    /// Load the transcript for `key` from `dir`, or start a new one if no
    /// file exists yet. A stored empty list also starts fresh.
    pub fn load_or_new(dir: &Path, key: &str, now: DateTime<Utc>) -> Result<Self, ChatError> {
        let path = Self::path_in(dir, key);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No stored transcript, starting new conversation");
            return Ok(Self::new(key, now));
        }
        let content = std::fs::read_to_string(&path)?;
        let messages: Vec<Message> = serde_json::from_str(&content)?;
        if messages.is_empty() {
            return Ok(Self::new(key, now));
        }
        tracing::info!(path = %path.display(), messages = messages.len(), "Transcript loaded");
        Ok(Self {
            key: key.to_string(),
            messages,
        })
    }

    /// Write the transcript to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<(), ChatError> {
        std::fs::create_dir_all(dir)?;
        let path = Self::path_in(dir, &self.key);
        let content = serde_json::to_string_pretty(&self.messages)?;
        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), messages = self.messages.len(), "Transcript saved");
        Ok(())
    }
}

// =============================================================================
// HistoryReport
// =============================================================================

/// Date-filtered, plain-text view over a transcript.
///
/// Dates are calendar days in the report's offset; an end date includes
/// the whole of that day.
#[derive(Debug, Clone)]
pub struct HistoryReport {
    offset: FixedOffset,
}

impl HistoryReport {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Messages whose local date falls within `[start, end]`. Either bound
    /// may be omitted.
    pub fn filter<'a>(
        &self,
        messages: &'a [Message],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<&'a Message>, ChatError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ChatError::InvalidDateRange { start, end });
            }
        }
        Ok(messages
            .iter()
            .filter(|m| {
                let day = m.timestamp.with_timezone(&self.offset).date_naive();
                start.map_or(true, |s| day >= s) && end.map_or(true, |e| day <= e)
            })
            .collect())
    }

    /// Render one line per message: `<d Mon YYYY, HH:MM>: <User|OzBot>: <text>`.
    pub fn export(&self, messages: &[&Message]) -> Result<String, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::EmptyReport);
        }
        let lines: Vec<String> = messages
            .iter()
            .map(|m| {
                format!(
                    "{}: {}: {}",
                    m.timestamp
                        .with_timezone(&self.offset)
                        .format("%-d %b %Y, %H:%M"),
                    m.sender.display_name(),
                    m.text
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// Download file name for a report about `subject` generated on `today`.
    pub fn file_name(subject: &str, today: NaiveDate) -> String {
        let subject: String = subject
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        format!("chat_history_{}_{}.txt", subject, today.format("%Y-%m-%d"))
    }
}
