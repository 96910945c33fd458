//! Clap derive structures for the `ipfence` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ipfence -- keep Cosmos DB account IP firewall rules in shape
#[derive(Debug, Parser)]
#[command(
    name = "ipfence",
    version,
    about = "Reconcile Azure Cosmos DB IP firewall rules",
    long_about = "Manage the IP rules of Azure Cosmos DB accounts without clobbering\n\
        rules added by anyone else.\n\n\
        ipfence remembers which rules it put on each account and only ever\n\
        removes those. Accounts without any IP rule are publicly reachable\n\
        and are never narrowed.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "IPFENCE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Directory (tenant) id of the service principal [fallback: ARM_TENANT_ID]
    #[arg(long, global = true)]
    pub tenant_id: Option<String>,

    /// Application (client) id of the service principal [fallback: ARM_CLIENT_ID]
    #[arg(long, global = true)]
    pub client_id: Option<String>,

    /// Client secret of the service principal [fallback: ARM_CLIENT_SECRET]
    #[arg(long, global = true)]
    pub client_secret: Option<String>,

    /// Tracked state file (overrides profile)
    #[arg(long, env = "IPFENCE_STATE_FILE", global = true)]
    pub state_file: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "IPFENCE_OUTPUT",
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

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "IPFENCE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one rule per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Show an account's current IP rules
    Show(AccountArgs),

    /// Preview the changes `apply` would make
    Plan(RulesArgs),

    /// Reconcile an account toward the given rules and wait for completion
    Apply(RulesArgs),

    /// Re-read an account and prune tracked rules that no longer exist
    Refresh(AccountArgs),

    /// Remove the rules ipfence manages and stop tracking the account
    Release(ReleaseArgs),

    /// Inspect CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AccountArgs {
    /// Full resource id of the database account
    /// (/subscriptions/.../databaseAccounts/<name>)
    pub account_id: String,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Full resource id of the database account
    pub account_id: String,

    /// Desired IP address or CIDR range (repeatable, comma-separated)
    #[arg(long = "rule", short = 'r', value_name = "CIDR", value_delimiter = ',')]
    pub rules: Vec<String>,
}

#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Full resource id of the database account
    pub account_id: String,

    /// Forget the account without touching its remote rules
    #[arg(long)]
    pub keep_remote: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file path
    Path,

    /// Show the effective configuration (secrets redacted)
    Show,
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
