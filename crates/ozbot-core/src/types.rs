use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{OzbotError, Result};

// =============================================================================
// Procedures
// =============================================================================

/// A Standard Operating Procedure the assistant can look up and walk through.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// Stable identifier, unique within a catalog.
    pub id: String,
    pub title: String,
    pub summary: String,
    /// Lookup keywords, matched case-insensitively against search queries.
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub glossary: Vec<GlossaryEntry>,
}

/// A titled group of consecutive steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(alias = "title")]
    pub heading: String,
    pub steps: Vec<String>,
}

/// A glossary term and its definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

impl Procedure {
    /// All steps in section order, flattened.
    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.sections
            .iter()
            .flat_map(|s| s.steps.iter().map(String::as_str))
    }

    /// The step at `index` in the flattened sequence.
    pub fn step(&self, index: usize) -> Option<&str> {
        self.steps().nth(index)
    }

    pub fn total_steps(&self) -> usize {
        self.sections.iter().map(|s| s.steps.len()).sum()
    }

    /// Look up a glossary term, ignoring case and surrounding whitespace.
    pub fn define(&self, term: &str) -> Option<&str> {
        let wanted = term.trim().to_lowercase();
        self.glossary
            .iter()
            .find(|g| g.term.trim().to_lowercase() == wanted)
            .map(|g| g.definition.as_str())
    }

    /// Reject procedures that cannot be addressed or displayed.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(OzbotError::InvalidProcedure {
                id: self.id.clone(),
                reason: "id is empty".to_string(),
            });
        }
        if self.title.trim().is_empty() {
            return Err(OzbotError::InvalidProcedure {
                id: self.id.clone(),
                reason: "title is empty".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Messages
// =============================================================================

/// Who sent a transcript message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Name shown in exported reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "OzBot",
        }
    }
}

/// One entry in a conversation transcript.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp,
        }
    }
}

// =============================================================================
// Roles
// =============================================================================

/// The kind of user driving a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    Client,
}

impl Role {
    /// Key under which this role's transcript is persisted.
    pub fn history_key(&self) -> &'static str {
        match self {
            Role::Admin => "adminVoiceHistory",
            Role::Client => "clientVoiceHistory",
        }
    }

    /// Admin sessions greet aloud on start; client sessions stay silent.
    pub fn speaks_greeting(&self) -> bool {
        matches!(self, Role::Admin)
    }
}
