//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::dispatch::FanOut;

use super::defaults;

/// wa-relay: WhatsApp event to webhook forwarder
///
/// Reads newline-delimited JSON events and forwards each one, signed with
/// HMAC-SHA256, to every configured webhook.
#[derive(Debug, Parser)]
#[command(name = "wa-relay")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Webhook URL (can be specified multiple times; replaces the config file list)
    #[arg(long = "webhook", value_name = "URL")]
    pub webhooks: Vec<String>,

    /// Secret used to sign payloads
    #[arg(long)]
    pub secret: Option<String>,

    /// Own WhatsApp identity, used to compute `from_me`
    #[arg(long = "own-id", value_name = "JID")]
    pub own_id: Option<String>,

    /// Directory where media attachments are written
    #[arg(long = "media-path")]
    pub media_path: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Treat non-2xx responses as failed deliveries
    #[arg(long = "strict-status")]
    pub strict_status: bool,

    /// What to do when a webhook fails
    #[arg(long = "fan-out", value_enum)]
    pub fan_out: Option<FanOutArg>,

    /// Maximum number of events forwarded at the same time
    #[arg(long = "max-in-flight", value_name = "N")]
    pub max_in_flight: Option<usize>,

    /// Maximum number of delivery attempts
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial retry delay in seconds
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// File of newline-delimited JSON events (default: stdin)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Test mode - log payloads without sending webhooks
    #[arg(long)]
    pub dry_run: bool,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for wa-relay
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = defaults::CONFIG_FILE)]
        output: PathBuf,
    },
}

/// Fan-out argument for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FanOutArg {
    /// Stop at the first failing webhook
    #[value(name = "fail-fast")]
    FailFast,
    /// Try every webhook and report all failures
    #[value(name = "best-effort")]
    BestEffort,
}

impl From<FanOutArg> for FanOut {
    fn from(arg: FanOutArg) -> Self {
        match arg {
            FanOutArg::FailFast => Self::FailFast,
            FanOutArg::BestEffort => Self::BestEffort,
        }
    }
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
