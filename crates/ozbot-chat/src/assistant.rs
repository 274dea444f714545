//! Assistant host: owns one conversation and threads its state through the
//! engine.
//!
//! Each call to [`Assistant::handle`] is one full turn: validate, record the
//! user message, respond, commit the new state, record the reply, persist.
//! Taking `&mut self` means a second turn cannot start until the first has
//! been committed.

use std::path::{Path, PathBuf};

use chrono::Utc;

use ozbot_core::config::OzbotConfig;
use ozbot_core::types::{Procedure, Role, Sender};

use crate::catalog::Catalog;
use crate::engine::GuideEngine;
use crate::error::ChatError;
use crate::session::SessionState;
use crate::transcript::Transcript;

pub struct Assistant {
    engine: GuideEngine,
    catalog: Catalog,
    state: SessionState,
    transcript: Transcript,
    max_message_length: usize,
    data_dir: Option<PathBuf>,
}

impl Assistant {
    /// Create an in-memory assistant with a fresh transcript.
    pub fn new(engine: GuideEngine, catalog: Catalog, role: Role, max_message_length: usize) -> Self {
        Self {
            engine,
            catalog,
            state: SessionState::Idle,
            transcript: Transcript::new(role.history_key(), Utc::now()),
            max_message_length,
            data_dir: None,
        }
    }

    /// Build an assistant from configuration, loading uploads from the
    /// configured directory and resuming the role's stored transcript from
    /// `data_dir`.
    pub fn from_config(config: &OzbotConfig, role: Role, data_dir: &Path) -> Result<Self, ChatError> {
        let engine = GuideEngine::from_config(&config.assistant)?;
        let mut catalog = Catalog::seed();
        if let Some(ref dir) = config.catalog.upload_dir {
            catalog.load_uploads(Path::new(dir))?;
        }
        let transcript = Transcript::load_or_new(data_dir, role.history_key(), Utc::now())?;
        tracing::info!(
            role = ?role,
            procedures = catalog.len(),
            messages = transcript.len(),
            "Assistant ready"
        );
        Ok(Self {
            engine,
            catalog,
            state: SessionState::Idle,
            transcript,
            max_message_length: config.assistant.max_message_length,
            data_dir: Some(data_dir.to_path_buf()),
        })
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Add uploaded procedures to this session's catalog.
    pub fn upload(&mut self, procedures: Vec<Procedure>) -> Result<usize, ChatError> {
        self.catalog.extend_uploaded(procedures)
    }

    /// Run one conversational turn and return the reply text.
    ///
    /// Transcript persistence is best effort here: a save failure is logged
    /// and the reply is still returned.
    pub fn handle(&mut self, utterance: &str) -> Result<String, ChatError> {
        let text = utterance.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if text.chars().count() > self.max_message_length {
            return Err(ChatError::MessageTooLong(self.max_message_length));
        }

        self.transcript.push(Sender::User, text, Utc::now());
        let outcome = self.engine.respond(text, &self.state, &self.catalog);
        if outcome.state != self.state {
            tracing::debug!(
                from = self.state.current_step_index(),
                to = outcome.state.current_step_index(),
                procedure = ?outcome.state.active_procedure().map(|p| p.id.as_str()),
                "Session state changed"
            );
        }
        self.state = outcome.state;
        self.transcript
            .push(Sender::Assistant, outcome.reply.clone(), Utc::now());
        if let Err(e) = self.persist() {
            tracing::warn!(error = %e, key = self.transcript.key(), "Failed to save transcript");
        }
        Ok(outcome.reply)
    }

    /// Start a new conversation: clear any guide and reset the transcript.
    pub fn new_chat(&mut self) -> Result<(), ChatError> {
        self.state = SessionState::Idle;
        self.transcript.reset(Utc::now());
        tracing::info!(key = self.transcript.key(), "New conversation started");
        self.persist()
    }

    fn persist(&self) -> Result<(), ChatError> {
        match self.data_dir {
            Some(ref dir) => self.transcript.save(dir),
            None => Ok(()),
        }
    }
}
