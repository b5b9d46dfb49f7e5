//! Clap derive structures for the `tuyasense` CLI.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// tuyasense -- poll Tuya cloud sensors from the command line
#[derive(Debug, Parser)]
#[command(
    name = "tuyasense",
    version,
    about = "Discover and poll Tuya cloud sensors",
    long_about = "Discovers sensor data points on a Tuya cloud project, classifies them\n\
        (temperature, humidity, power, ...) and polls each device on a fixed\n\
        schedule.",
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
    #[arg(long, short = 'p', env = "TUYASENSE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Cloud project Access ID (overrides profile)
    #[arg(long, env = "TUYASENSE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Cloud project Access Secret (overrides profile)
    #[arg(long, env = "TUYASENSE_API_SECRET", global = true, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Data center: us, eu, cn, in
    #[arg(long, short = 'r', env = "TUYASENSE_REGION", global = true)]
    pub region: Option<String>,

    /// Device id to poll (repeatable; default: every device on the account)
    #[arg(long = "device", short = 'd', value_delimiter = ',', global = true)]
    pub devices: Vec<String>,

    /// Only expose these data-point codes
    #[arg(long, value_delimiter = ',', global = true)]
    pub include: Vec<String>,

    /// Never expose these data-point codes
    #[arg(long, value_delimiter = ',', global = true)]
    pub exclude: Vec<String>,

    /// Poll period in seconds (minimum 30)
    #[arg(long, env = "TUYASENSE_SCAN_INTERVAL", global = true)]
    pub scan_interval: Option<u64>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TUYASENSE_OUTPUT",
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

    /// Request timeout in seconds
    #[arg(long, env = "TUYASENSE_TIMEOUT", global = true)]
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
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect, discover devices, and list the sensors found
    #[command(alias = "ls")]
    Discover,

    /// Refresh every device once and print current values
    Read(ReadArgs),

    /// Poll on schedule and print updates until Ctrl-C
    Watch(WatchArgs),

    /// Manage configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ReadArgs {
    /// Only show readings whose device or sensor name contains this text
    #[arg(long, short = 'f')]
    pub filter: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Exit after this many coordinator updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file location
    Path,

    /// Show the current configuration (secrets redacted)
    Show,

    /// Interactive setup wizard
    Init,

    /// Store the Access Secret for a profile in the system keyring
    SetSecret {
        /// Profile name (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
