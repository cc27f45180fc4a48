//! Clap derive structures for the `siren` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// siren -- live alarm notifications for your telemetry backend
#[derive(Debug, Parser)]
#[command(
    name = "siren",
    version,
    about = "Watch, acknowledge, and ignore telemetry alarms from the command line",
    long_about = "Subscribes to a telemetry backend's alarm notification stream and\n\
        maintains one live notification per (device, alarm type): repeated\n\
        pushes coalesce into updates, and a notification only goes away when\n\
        you acknowledge or ignore it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend base URL (overrides config file)
    #[arg(long, short = 'b', env = "SIREN_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SIREN_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "SIREN_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default 30)
    #[arg(long, env = "SIREN_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch live alarm notifications (Ctrl-C to exit)
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// List, acknowledge, or ignore alarms
    #[command(alias = "a")]
    Alarms(AlarmsArgs),

    /// Show or edit the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Reconnect delay in seconds after a stream drop
    #[arg(long, default_value = "5")]
    pub reconnect_delay: u64,
}

// ── alarms ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AlarmsArgs {
    #[command(subcommand)]
    pub command: AlarmsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlarmsCommand {
    /// List alarms
    #[command(alias = "ls")]
    List {
        /// Only alarms nobody has acknowledged yet
        #[arg(long)]
        unacknowledged: bool,
    },

    /// Acknowledge an alarm (confirms it was handled)
    Ack {
        /// Alarm id
        id: String,
    },

    /// Ignore an alarm (clears it on the backend)
    Clear {
        /// Alarm id
        id: String,
    },

    /// Show aggregate alarm counters
    Stats,
}

// ── config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set a config value (backend, insecure, timeout)
    Set {
        /// Key to set
        key: String,
        /// New value
        value: String,
    },
}

// ── completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
