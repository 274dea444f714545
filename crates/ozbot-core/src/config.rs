use std::path::Path;

use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{OzbotError, Result};

/// Top-level configuration for OzBot.
///
/// Loaded from `~/.ozbot/config.toml` by default. Every section is optional
/// in the file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OzbotConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
}

impl OzbotConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: OzbotConfig = toml::from_str(&content)?;
        config.assistant.offset()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding persisted transcripts.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.ozbot/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Name used in greetings.
    pub user_name: String,
    /// Offset from UTC, in minutes, used for time replies and reports.
    pub utc_offset_minutes: i32,
    /// Label printed after clock times, e.g. "IST".
    pub zone_label: String,
    /// Longest accepted utterance, in characters.
    pub max_message_length: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            user_name: "Admin User".to_string(),
            utc_offset_minutes: 330,
            zone_label: "IST".to_string(),
            max_message_length: 2000,
        }
    }
}

impl AssistantConfig {
    /// The configured offset as a chrono timezone.
    pub fn offset(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            OzbotError::Config(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })
    }
}

/// Procedure catalog sources.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory of uploaded procedure JSON files appended to the seed catalog.
    pub upload_dir: Option<String>,
}

/// Speech input/output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether replies are passed to the speech sink.
    pub enabled: bool,
    /// BCP 47 language tag for capture and synthesis.
    pub language: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: "en-US".to_string(),
        }
    }
}
