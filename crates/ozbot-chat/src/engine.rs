//! Guided-procedure conversational engine.
//!
//! [`GuideEngine::respond`] maps one utterance plus the current
//! [`SessionState`] to a reply and the next state. It performs no I/O and
//! never mutates its inputs; the host threads the returned state into the
//! next call.
//!
//! Matching is plain substring containment on the lower-cased utterance.
//! Rules are tried in table order and the first one that produces an
//! outcome wins, so the tables below define precedence.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use ozbot_core::config::AssistantConfig;
use ozbot_core::error::OzbotError;
use ozbot_core::types::Procedure;

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::session::SessionState;

// =============================================================================
// Patterns
// =============================================================================

/// Phrases that start a procedure search. The first occurrence is removed
/// to leave the search query.
static SEARCH_TRIGGER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"find sop for|search sop for|what is the procedure for")
        .expect("Invalid search trigger regex")
});

static GLOSSARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"what (?:is|does) (.+?) mean").expect("Invalid glossary regex")
});

const LIST_PHRASES: &[&str] = &["list sop", "show sops"];
const EXIT_PHRASES: &[&str] = &["exit", "stop guide"];

const FALLBACK_REPLY: &str = "I didn't understand that. Try asking about SOPs, like 'Find SOP for emergency shutdown' or 'List SOPs'.";
const NO_STEP_REPLY: &str = "I'm not on a specific step to repeat.";
const EMPTY_CATALOG_REPLY: &str = "No SOPs available yet.";

/// Small-talk intents handled while idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocialIntent {
    Greeting,
    TimeOfDay,
    Thanks,
    Identity,
    WellBeing,
}

/// Checked in order; the first intent with a matching phrase answers.
const SOCIAL_INTENTS: &[(SocialIntent, &[&str])] = &[
    (SocialIntent::Greeting, &["hello", "hi", "hey ozbot"]),
    (SocialIntent::TimeOfDay, &["time"]),
    (SocialIntent::Thanks, &["thank"]),
    (SocialIntent::Identity, &["your name"]),
    (SocialIntent::WellBeing, &["how are you"]),
];

// =============================================================================
// Rule tables
// =============================================================================

/// Result of one engine call.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub reply: String,
    pub state: SessionState,
}

impl Outcome {
    fn new(reply: impl Into<String>, state: SessionState) -> Self {
        Self {
            reply: reply.into(),
            state,
        }
    }
}

struct GuidedTurn<'a> {
    text: &'a str,
    procedure: &'a Arc<Procedure>,
    step_index: usize,
    catalog: &'a Catalog,
}

impl GuidedTurn<'_> {
    fn unchanged(&self, reply: impl Into<String>) -> Outcome {
        Outcome::new(
            reply,
            SessionState::Guiding {
                procedure: Arc::clone(self.procedure),
                step_index: self.step_index,
            },
        )
    }
}

struct IdleTurn<'a> {
    text: &'a str,
    catalog: &'a Catalog,
}

type GuidedRule = fn(&GuideEngine, &GuidedTurn<'_>) -> Option<Outcome>;
type IdleRule = fn(&GuideEngine, &IdleTurn<'_>) -> Option<Outcome>;

static GUIDED_RULES: &[(&str, GuidedRule)] = &[
    ("next_step", GuideEngine::next_step),
    ("repeat_step", GuideEngine::repeat_step),
    ("exit_guide", GuideEngine::exit_guide),
    ("define_term", GuideEngine::define_term),
];

static IDLE_RULES: &[(&str, IdleRule)] = &[
    ("find_procedure", GuideEngine::find_procedure),
    ("list_procedures", GuideEngine::list_procedures),
    ("small_talk", GuideEngine::small_talk),
];

// =============================================================================
// GuideEngine
// =============================================================================

/// Stateless reply generator for guided-procedure conversations.
pub struct GuideEngine {
    user_name: String,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for GuideEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuideEngine")
            .field("user_name", &self.user_name)
            .field("zone_label", &self.clock.zone_label())
            .finish()
    }
}

impl GuideEngine {
    pub fn new(user_name: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            user_name: user_name.into(),
            clock,
        }
    }

    /// Build an engine on the wall clock, using the configured name and zone.
    pub fn from_config(config: &AssistantConfig) -> Result<Self, OzbotError> {
        let clock = SystemClock::new(config.offset()?, config.zone_label.clone());
        Ok(Self::new(config.user_name.clone(), Arc::new(clock)))
    }

    /// Produce the reply to `utterance` and the state that follows it.
    pub fn respond(&self, utterance: &str, state: &SessionState, catalog: &Catalog) -> Outcome {
        let text = utterance.to_lowercase();

        match state {
            SessionState::Guiding {
                procedure,
                step_index,
            } => {
                let turn = GuidedTurn {
                    text: &text,
                    procedure,
                    step_index: *step_index,
                    catalog,
                };
                for (name, rule) in GUIDED_RULES {
                    if let Some(outcome) = rule(self, &turn) {
                        tracing::debug!(rule = name, procedure = %procedure.id, "Guided rule matched");
                        return outcome;
                    }
                }
                turn.unchanged(format!(
                    "You're in guided mode for \"{}\". Say \"next step\", \"repeat step\", or \"exit guide\".",
                    procedure.title
                ))
            }
            SessionState::Idle => {
                let turn = IdleTurn {
                    text: &text,
                    catalog,
                };
                for (name, rule) in IDLE_RULES {
                    if let Some(outcome) = rule(self, &turn) {
                        tracing::debug!(rule = name, "Idle rule matched");
                        return outcome;
                    }
                }
                Outcome::new(FALLBACK_REPLY, SessionState::Idle)
            }
        }
    }

    // -----------------------------------------------------------------
    // Guided rules
    // -----------------------------------------------------------------

    fn next_step(&self, turn: &GuidedTurn<'_>) -> Option<Outcome> {
        if !turn.text.contains("next") {
            return None;
        }
        let title = &turn.procedure.title;
        let next = turn
            .step_index
            .checked_add(1)
            .and_then(|i| turn.procedure.step(i).map(|step| (i, step)));
        let outcome = match next {
            Some((next_index, step)) => Outcome::new(
                format!(
                    "Okay, here is the next step for \"{}\": {}",
                    title,
                    sentence(step)
                ),
                SessionState::Guiding {
                    procedure: Arc::clone(turn.procedure),
                    step_index: next_index,
                },
            ),
            None => {
                tracing::info!(procedure = %turn.procedure.id, "Guided procedure completed");
                Outcome::new(
                    format!("You have completed all steps for \"{}\".", title),
                    SessionState::Idle,
                )
            }
        };
        Some(outcome)
    }

    fn repeat_step(&self, turn: &GuidedTurn<'_>) -> Option<Outcome> {
        if !turn.text.contains("repeat") {
            return None;
        }
        let reply = match turn.procedure.step(turn.step_index) {
            Some(step) => format!(
                "Repeating current step for \"{}\": {}",
                turn.procedure.title,
                sentence(step)
            ),
            None => NO_STEP_REPLY.to_string(),
        };
        Some(turn.unchanged(reply))
    }

    fn exit_guide(&self, turn: &GuidedTurn<'_>) -> Option<Outcome> {
        if !contains_any(turn.text, EXIT_PHRASES) {
            return None;
        }
        tracing::info!(procedure = %turn.procedure.id, step = turn.step_index, "Guided procedure ended early");
        Some(Outcome::new(
            format!("Ended the guided procedure for \"{}\".", turn.procedure.title),
            SessionState::Idle,
        ))
    }

    /// Answers "what is X mean" / "what does X mean" from the first catalog
    /// glossary, in catalog order, that defines the term. Declines when the
    /// term is unknown so the guided reminder answers instead.
    fn define_term(&self, turn: &GuidedTurn<'_>) -> Option<Outcome> {
        let caps = GLOSSARY_RE.captures(turn.text)?;
        let term = caps.get(1)?.as_str().trim();
        if term.is_empty() {
            return None;
        }
        let definition = turn.catalog.glossary_lookup(term)?;
        Some(turn.unchanged(format!("{} means: {}", term, sentence(definition))))
    }

    // -----------------------------------------------------------------
    // Idle rules
    // -----------------------------------------------------------------

    fn find_procedure(&self, turn: &IdleTurn<'_>) -> Option<Outcome> {
        if !SEARCH_TRIGGER_RE.is_match(turn.text) {
            return None;
        }
        let query = SEARCH_TRIGGER_RE.replacen(turn.text, 1, "");
        let query = query.trim();

        let Some(procedure) = turn.catalog.find_by_query(query) else {
            tracing::debug!(query, "No procedure matched search");
            return Some(Outcome::new(
                format!("I couldn't find an SOP for \"{}\".", query),
                SessionState::Idle,
            ));
        };

        let intro = format!(
            "I found the SOP for \"{}\". It's about {}",
            procedure.title,
            sentence(&procedure.summary)
        );
        let outcome = match procedure.step(0) {
            Some(first) => {
                tracing::info!(procedure = %procedure.id, query, "Guided procedure started");
                Outcome::new(
                    format!("{} Let's start with the first step: {}", intro, sentence(first)),
                    SessionState::guiding(Arc::clone(procedure)),
                )
            }
            None => Outcome::new(
                format!("{} It has no steps to walk through.", intro),
                SessionState::Idle,
            ),
        };
        Some(outcome)
    }

    fn list_procedures(&self, turn: &IdleTurn<'_>) -> Option<Outcome> {
        if !contains_any(turn.text, LIST_PHRASES) {
            return None;
        }
        let reply = if turn.catalog.is_empty() {
            EMPTY_CATALOG_REPLY.to_string()
        } else {
            format!("I have SOPs for: {}.", turn.catalog.titles().join(", "))
        };
        Some(Outcome::new(reply, SessionState::Idle))
    }

    fn small_talk(&self, turn: &IdleTurn<'_>) -> Option<Outcome> {
        let (intent, _) = SOCIAL_INTENTS
            .iter()
            .find(|(_, phrases)| contains_any(turn.text, phrases))?;

        let reply = match intent {
            SocialIntent::Greeting => {
                format!("Hello {}! How can I help you today?", self.user_name)
            }
            SocialIntent::TimeOfDay => format!(
                "Current time is {} {}.",
                self.clock.now().format("%H:%M"),
                self.clock.zone_label()
            ),
            SocialIntent::Thanks => "You're welcome!".to_string(),
            SocialIntent::Identity => "I'm OzBot, your AI assistant.".to_string(),
            SocialIntent::WellBeing => "I'm great, thank you for asking!".to_string(),
        };
        Some(Outcome::new(reply, SessionState::Idle))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn contains_any(text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| text.contains(p))
}

/// Terminate `text` with a period unless it already ends a sentence.
fn sentence(text: &str) -> String {
    let text = text.trim_end();
    if text.ends_with(|c: char| matches!(c, '.' | '!' | '?')) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

// =============================================================================
// Tests
// =============================================================================
