//! CLI argument definitions for the OzBot application.
//!
//! Uses `clap` with derive macros for argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use ozbot_core::types::Role;

/// OzBot: a voice assistant that walks you through standard operating procedures.
#[derive(Parser, Debug)]
#[command(name = "ozbot", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding persisted transcripts.
    #[arg(short = 'd', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Whose conversation to use.
    #[arg(short = 'r', long = "role", value_enum, default_value_t = RoleArg::Admin, global = true)]
    pub role: RoleArg,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Talk to OzBot, one utterance per line on stdin (the default).
    Chat,
    /// List the titles of every procedure in the catalog.
    List,
    /// Print or save the transcript, optionally limited to a date range.
    History {
        /// First day to include (YYYY-MM-DD).
        #[arg(long = "from")]
        from: Option<NaiveDate>,
        /// Last day to include (YYYY-MM-DD), inclusive.
        #[arg(long = "to")]
        to: Option<NaiveDate>,
        /// File or directory to write the report to instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
        /// Name used in the generated report file name.
        #[arg(long = "subject")]
        subject: Option<String>,
    },
    /// Clear the stored conversation and start over.
    NewChat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleArg {
    Admin,
    Client,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Admin => Role::Admin,
            RoleArg::Client => Role::Client,
        }
    }
}

impl CliArgs {
    /// The subcommand to run; `chat` when none is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat)
    }

    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > OZBOT_CONFIG env var > platform default (~/.ozbot/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("OZBOT_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the transcript directory.
    ///
    /// Priority: --data-dir flag > config file value, with a leading `~`
    /// expanded to the home directory.
    pub fn resolve_data_dir(&self, config_data_dir: &str) -> PathBuf {
        match self.data_dir {
            Some(ref p) => p.clone(),
            None => expand_home(config_data_dir),
        }
    }

    /// Resolve the log filter directive.
    ///
    /// Priority: --log-level flag > RUST_LOG env var > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        if let Some(ref level) = self.log_level {
            return level.clone();
        }
        if let Ok(filter) = std::env::var("RUST_LOG") {
            if !filter.trim().is_empty() {
                return filter;
            }
        }
        config_level.to_string()
    }
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    let home = std::env::var("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = std::env::var("HOME");
    home.ok().map(PathBuf::from)
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    match home_dir() {
        Some(home) => home.join(".ozbot").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(rest);
        }
        return PathBuf::from(".").join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("ozbot").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_to_admin_chat() {
        let cli = parse(&[]);
        assert_eq!(cli.command(), Command::Chat);
        assert_eq!(Role::from(cli.role), Role::Admin);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = parse(&["list", "--role", "client", "-d", "/tmp/ozbot"]);
        assert_eq!(cli.command(), Command::List);
        assert_eq!(Role::from(cli.role), Role::Client);
        assert_eq!(cli.resolve_data_dir("~/.ozbot/data"), PathBuf::from("/tmp/ozbot"));
    }

    #[test]
    fn test_history_dates_parse() {
        let cli = parse(&["history", "--from", "2025-07-10", "--to", "2025-07-12"]);
        match cli.command() {
            Command::History { from, to, output, subject } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2025, 7, 10));
                assert_eq!(to, NaiveDate::from_ymd_opt(2025, 7, 12));
                assert!(output.is_none());
                assert!(subject.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_history_rejects_bad_date() {
        let result = CliArgs::try_parse_from(["ozbot", "history", "--from", "10/07/2025"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_flag_wins() {
        let cli = parse(&["--config", "/etc/ozbot.toml"]);
        assert_eq!(cli.resolve_config_path(), PathBuf::from("/etc/ozbot.toml"));
    }

    #[test]
    fn test_log_level_flag_wins() {
        let cli = parse(&["-l", "debug"]);
        assert_eq!(cli.resolve_log_level("warn"), "debug");
    }

    #[test]
    fn test_expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/var/lib/ozbot"), PathBuf::from("/var/lib/ozbot"));
        assert!(expand_home("~/.ozbot/data").ends_with(".ozbot/data"));
    }
}
