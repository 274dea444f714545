//! OzBot application binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialize tracing
//! 3. Build the assistant (seed + uploaded catalog, stored transcript)
//! 4. Run the requested subcommand

mod cli;
mod console;

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, Utc};
use clap::Parser;

use ozbot_chat::{Assistant, ChatError, HistoryReport, Transcript, VoiceLoop};
use ozbot_core::config::OzbotConfig;
use ozbot_core::types::Role;

use cli::{CliArgs, Command};
use console::{StdinSource, StdoutSink};

fn init_tracing(directive: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(directive)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_chat(config: &OzbotConfig, role: Role, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut assistant = Assistant::from_config(config, role, data_dir)?;
    if !config.voice.enabled {
        tracing::warn!("Voice output disabled in config; replies are only recorded in the transcript");
    }
    tracing::info!(language = %config.voice.language, "Voice loop started");

    let mut voice = VoiceLoop::new(StdinSource::new(), StdoutSink)
        .with_greeting(role.speaks_greeting())
        .with_speech(config.voice.enabled);
    let turns = voice.run(&mut assistant).await?;
    tracing::debug!(turns, "Chat session closed");
    Ok(())
}

fn run_list(config: &OzbotConfig, role: Role, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let assistant = Assistant::from_config(config, role, data_dir)?;
    for procedure in assistant.catalog().iter() {
        println!("{}\t{} ({} steps)", procedure.id, procedure.title, procedure.total_steps());
    }
    Ok(())
}

/// Export the messages in `range`. Terminal output is headed by the
/// conversation title; report files carry message lines only.
fn render_history(
    transcript: &Transcript,
    report: &HistoryReport,
    range: (Option<NaiveDate>, Option<NaiveDate>),
    titled: bool,
) -> Result<String, ChatError> {
    let picked = report.filter(transcript.messages(), range.0, range.1)?;
    let text = report.export(&picked)?;
    match transcript.title() {
        Some(title) if titled => Ok(format!("Conversation: {}\n\n{}", title, text)),
        _ => Ok(text),
    }
}

fn run_history(
    config: &OzbotConfig,
    role: Role,
    data_dir: &Path,
    range: (Option<NaiveDate>, Option<NaiveDate>),
    output: Option<PathBuf>,
    subject: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let offset = config.assistant.offset()?;
    let transcript = Transcript::load_or_new(data_dir, role.history_key(), Utc::now())?;
    let report = HistoryReport::new(offset);

    match output {
        None => println!("{}", render_history(&transcript, &report, range, true)?),
        Some(path) => {
            let text = render_history(&transcript, &report, range, false)?;
            let path = if path.is_dir() {
                let subject = subject.unwrap_or_else(|| config.assistant.user_name.clone());
                let today = Utc::now().with_timezone(&offset).date_naive();
                path.join(HistoryReport::file_name(&subject, today))
            } else {
                path
            };
            std::fs::write(&path, text)?;
            tracing::info!(path = %path.display(), "History report written");
        }
    }
    Ok(())
}

fn run_new_chat(config: &OzbotConfig, role: Role, data_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut assistant = Assistant::from_config(config, role, data_dir)?;
    assistant.new_chat()?;
    println!("Started a new conversation for {:?}.", role);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliArgs::parse();

    // Config is read before tracing so the configured level applies;
    // the outcome is logged once the subscriber is up.
    let config_file = cli.resolve_config_path();
    let loaded = OzbotConfig::load(&config_file);
    let config_level = loaded
        .as_ref()
        .map(|c| c.general.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_tracing(&cli.resolve_log_level(&config_level));

    tracing::info!("Starting OzBot v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => {
            tracing::info!(path = %config_file.display(), "Configuration loaded");
            config
        }
        Err(e) => {
            tracing::warn!(path = %config_file.display(), error = %e, "Failed to load config, using defaults");
            OzbotConfig::default()
        }
    };

    let data_dir = cli.resolve_data_dir(&config.general.data_dir);
    let role = Role::from(cli.role);

    match cli.command() {
        Command::Chat => run_chat(&config, role, &data_dir).await,
        Command::List => run_list(&config, role, &data_dir),
        Command::History {
            from,
            to,
            output,
            subject,
        } => run_history(&config, role, &data_dir, (from, to), output, subject),
        Command::NewChat => run_new_chat(&config, role, &data_dir),
    }
}
