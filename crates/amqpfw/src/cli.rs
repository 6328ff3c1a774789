//! Clap derive structures for the `amqpfw` CLI.
//!
//! Defines the command tree, global flags, and shared types. Also compiled
//! by `build.rs` for man pages, so it must only depend on clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// amqpfw -- declarative firewall management for hosted broker instances
#[derive(Debug, Parser)]
#[command(
    name = "amqpfw",
    version,
    about = "Manage hosted message-broker firewalls from the command line",
    long_about = "Keeps the firewall of a hosted AMQP/MQTT/STOMP broker instance in sync\n\
        with a rules file. Every change replaces the instance's whole rule list.",
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
    /// Config profile to use
    #[arg(long, short = 'p', env = "AMQPFW_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "AMQPFW_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// API key (overrides profile and keyring)
    #[arg(long, env = "AMQPFW_API_KEY", global = true, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "AMQPFW_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "AMQPFW_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Retries for transient API failures; 0 disables (overrides profile)
    #[arg(long, env = "AMQPFW_RETRIES", global = true)]
    pub retries: Option<u32>,

    /// Directory for local resource state
    #[arg(long, env = "AMQPFW_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage an instance's firewall rules
    #[command(alias = "fw")]
    Firewall(FirewallArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  FIREWALL
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct FirewallArgs {
    #[command(subcommand)]
    pub command: FirewallCommand,
}

/// A rules file: `instance_id` plus a `rules` array (TOML, YAML or JSON).
#[derive(Debug, Args)]
pub struct RulesFileArgs {
    /// Path to the rules file
    #[arg(long, short = 'F')]
    pub file: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum FirewallCommand {
    /// Install the rules from a file on an instance with no tracked state
    Create(RulesFileArgs),

    /// Show the tracked rules of an instance
    #[command(alias = "get")]
    Show {
        /// Instance ID
        instance_id: i64,

        /// Read the rules from the API first and store them
        #[arg(long)]
        refresh: bool,
    },

    /// List instances with tracked state
    #[command(alias = "ls")]
    List,

    /// Replace the rules of a tracked instance with those from a file
    Update(RulesFileArgs),

    /// Create or update so the instance matches the file; no-op if it already does
    Apply(RulesFileArgs),

    /// Remove an instance's firewall configuration
    #[command(alias = "rm")]
    Delete {
        /// Instance ID
        instance_id: i64,
    },

    /// Start tracking an instance's existing firewall configuration
    Import {
        /// Instance ID (base-10)
        id: String,
    },

    /// Check a rules file without contacting the API
    Validate(RulesFileArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration (secrets masked)
    Show,

    /// Print the config file path
    Path,

    /// Store the active profile's API key in the system keyring
    SetKey,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
