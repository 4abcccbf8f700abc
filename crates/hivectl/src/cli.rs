//! Clap derive structures for the `hivectl` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hivectl -- read and set Hive heating thermostats
#[derive(Debug, Parser)]
#[command(
    name = "hivectl",
    version,
    about = "Read and control Hive heating from the command line",
    long_about = "Lists the thermostats, wall controllers and radiator valves on a\n\
        Hive account and sets target temperatures through the Hive cloud API.",
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
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HIVE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Account username (email address)
    #[arg(long, short = 'u', env = "HIVE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Account password
    #[arg(long, short = 'p', env = "HIVE_PASSWORD", global = true, hide_env = true)]
    pub password: Option<String>,

    /// API base URL (overrides config)
    #[arg(long, env = "HIVE_URL", global = true)]
    pub url: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "HIVE_OUTPUT",
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

    /// Accept any TLS certificate
    #[arg(long, short = 'k', env = "HIVE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "HIVE_TIMEOUT", global = true)]
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
    /// YAML
    Yaml,
    /// Tab-separated text, one device per line (scripting)
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

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List thermostats with current and target temperature
    #[command(alias = "list", alias = "t")]
    Thermostats,

    /// List every recognised device
    #[command(alias = "dev", alias = "d")]
    Devices,

    /// Set the target temperature of a thermostat
    Set(SetArgs),

    /// Poll thermostats and print readings until interrupted
    Watch(WatchArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Target temperature in degrees Celsius
    #[arg(allow_negative_numbers = true)]
    pub temperature: f64,

    /// Thermostat ID (defaults to the first thermostat)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls (defaults to the configured poll interval)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
